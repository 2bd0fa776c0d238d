//! # Error Types
//!
//! Every failure the client can hit, from dialing the game server to a
//! rejected command.
//!
//! ## Error Categories
//! - **Resolver**: the round lookup failed or returned an `error` field
//! - **Transport**: dial/read/write failures, timeouts, peer hang-ups
//! - **Framing / Decode**: broken line framing, bad base64 or JSON
//! - **Cryptographic**: AEAD tag failures and failed handshake challenges
//! - **Protocol**: unexpected packet types, missing or mismatched counters
//! - **Server rejection**: the server answered with an explicit `error`
//!
//! No error is retried internally. Errors for which [`ProtocolError::is_fatal`]
//! returns `true` have already closed the session that produced them.
//!
//! ## Example Usage
//! ```rust
//! use arena_client::error::{ProtocolError, Result};
//!
//! fn check_ticket(ticket: &str) -> Result<()> {
//!     if ticket.is_empty() {
//!         return Err(ProtocolError::ResolverError("empty ticket".into()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_ticket("").is_err());
//! ```

use crate::protocol::state::SessionState;
use std::io;
use thiserror::Error;

/// Static error messages shared across the crate.
pub mod constants {
    /// Counter guard
    pub const ERR_MISSING_PC: &str = "missing pc";
    pub const ERR_PC_MISMATCH: &str = "pc mismatch";
    pub const ERR_PC_EXHAUSTED: &str = "packet counter exhausted";

    /// Correlator
    pub const ERR_UNEXPECTED_PACKET: &str = "unexpected packet";

    /// Framing
    pub const ERR_FRAME_TOO_LONG: &str = "frame exceeds maximum length";
    pub const ERR_TRUNCATED_FRAME: &str = "stream closed before frame delimiter";

    /// Handshake
    pub const ERR_MISSING_CIPHER: &str = "serverhello carries no cipher";
    pub const ERR_CHALLENGE_MISMATCH: &str = "serverhello does not echo the challenge";

    /// Resolver
    pub const ERR_NO_ADDRESS: &str = "round information carries no server address";
    pub const ERR_KEY_LENGTH: &str = "symmetric key must be 32 bytes";
}

/// Primary error type for every client operation.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Resolver error: {0}")]
    ResolverError(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Framing error: {0}")]
    FramingError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    /// AEAD tag verification failed; the channel is abandoned.
    #[error("Authentication failed: ciphertext rejected")]
    AuthenticationFailure,

    #[error("Encryption failed")]
    EncryptionFailure,

    #[error("Handshake verification failed: {0}")]
    HandshakeVerification(String),

    #[error("Protocol error during {stage}: {reason} (expected {expected}, got {actual})")]
    Violation {
        stage: SessionState,
        reason: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Server rejected packet ({kind}): {message}")]
    ServerRejection { kind: String, message: String },

    #[error("Session closed")]
    SessionClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Build a [`ProtocolError::Violation`] for the given stage.
    pub fn violation(
        stage: SessionState,
        reason: &'static str,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        ProtocolError::Violation {
            stage,
            reason,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// The short reason of a protocol violation, e.g. `"pc mismatch"`.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ProtocolError::Violation { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Whether this error left the session unusable.
    pub fn is_fatal(&self) -> bool {
        match self {
            ProtocolError::AuthenticationFailure
            | ProtocolError::HandshakeVerification(_)
            | ProtocolError::SessionClosed
            | ProtocolError::ConnectionClosed => true,
            ProtocolError::Violation { reason, .. } => {
                *reason == constants::ERR_MISSING_PC || *reason == constants::ERR_PC_MISMATCH
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::DecodeError(err.to_string())
    }
}

impl From<base64::DecodeError> for ProtocolError {
    fn from(err: base64::DecodeError) -> Self {
        ProtocolError::DecodeError(format!("base64: {err}"))
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
