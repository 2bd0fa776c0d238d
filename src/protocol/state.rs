//! Session lifecycle states.

use std::fmt;

/// Lifecycle of a [`Session`](crate::service::session::Session).
///
/// The handshake walks these states strictly in declaration order. `Closed`
/// is terminal and reachable from any state. Whether frames are encrypted is
/// a property of the state, not a separate flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    Disconnected,
    Connecting,
    LoggingIn,
    ClientHelloSent,
    ServerHelloVerified,
    SyncingCounter,
    Agreeing,
    Ready,
    Closed,
}

impl SessionState {
    /// Frames are sealed from the moment the server proved it holds the key.
    #[inline]
    pub fn is_encrypted(self) -> bool {
        matches!(
            self,
            SessionState::ServerHelloVerified
                | SessionState::SyncingCounter
                | SessionState::Agreeing
                | SessionState::Ready
        )
    }

    #[inline]
    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }

    /// Stable lowercase name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::LoggingIn => "logging-in",
            SessionState::ClientHelloSent => "clienthello-sent",
            SessionState::ServerHelloVerified => "serverhello-verified",
            SessionState::SyncingCounter => "syncing-counter",
            SessionState::Agreeing => "agreeing",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encryption_follows_state() {
        assert!(!SessionState::Disconnected.is_encrypted());
        assert!(!SessionState::LoggingIn.is_encrypted());
        assert!(!SessionState::ClientHelloSent.is_encrypted());
        assert!(SessionState::ServerHelloVerified.is_encrypted());
        assert!(SessionState::Ready.is_encrypted());
        assert!(!SessionState::Closed.is_encrypted());
    }

    #[test]
    fn test_states_are_ordered() {
        assert!(SessionState::Connecting < SessionState::LoggingIn);
        assert!(SessionState::Agreeing < SessionState::Ready);
        assert_eq!(SessionState::SyncingCounter.to_string(), "syncing-counter");
    }
}
