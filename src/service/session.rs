//! Client session: the framed transport, the channel cipher and the packet
//! counter, plus a shareable handle for use across tasks.

use crate::config::ClientConfig;
use crate::core::codec::FrameCodec;
use crate::error::{ProtocolError, Result};
use crate::protocol::counter::PacketCounter;
use crate::protocol::state::SessionState;
use crate::service::player::Player;
use crate::utils::crypto::Cipher;
use crate::utils::metrics::global_metrics;
use crate::utils::timeout::with_timeout_error;

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::codec::Framed;
use tracing::{debug, instrument, warn};

/// One connection to the game server.
///
/// Owns the transport, the cipher and the packet counter. Whether frames are
/// sealed follows from [`SessionState`]; the counter exists only once the
/// server announced `initialpc`. After [`Session::close`] every operation
/// fails with [`ProtocolError::SessionClosed`].
pub struct Session {
    framed: Option<Framed<TcpStream, FrameCodec>>,
    pub(crate) cipher: Option<Cipher>,
    pub(crate) counter: Option<PacketCounter>,
    pub(crate) state: SessionState,
    peer: Option<SocketAddr>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("peer", &self.peer)
            .field("pc", &self.counter.map(|c| c.value()))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open the plain transport. The session starts in `Connecting`.
    #[instrument(skip(cipher, config))]
    pub(crate) async fn dial(address: &str, cipher: Cipher, config: &ClientConfig) -> Result<Self> {
        let stream = with_timeout_error(
            async {
                TcpStream::connect(address)
                    .await
                    .map_err(|e| ProtocolError::TransportError(format!("dial {address}: {e}")))
            },
            config.connect_timeout,
        )
        .await?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr().ok();
        debug!(?peer, "Transport open");

        Ok(Self {
            framed: Some(Framed::new(stream, FrameCodec::new(config.max_frame_length))),
            cipher: Some(cipher),
            counter: None,
            state: SessionState::Connecting,
            peer,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        })
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether frames are sealed. Derived from the state.
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.state.is_encrypted()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Last packet counter value sent, once the counter is synchronised.
    pub fn packet_counter(&self) -> Option<u32> {
        self.counter.map(|c| c.value())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Command handle bound to this session.
    pub fn player(&mut self) -> Player<'_> {
        Player::new(self)
    }

    pub(crate) fn transition(&mut self, next: SessionState) {
        if self.state.is_closed() {
            return;
        }
        debug!(from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    pub(crate) fn cipher(&self) -> Result<&Cipher> {
        self.cipher.as_ref().ok_or(ProtocolError::SessionClosed)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.state.is_closed() || self.framed.is_none() {
            return Err(ProtocolError::SessionClosed);
        }
        Ok(())
    }

    /// Write one frame, sealing and base64-encoding it when encrypted.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let wire = if self.is_encrypted() {
            self.cipher()?.seal_base64(payload)?.into_bytes()
        } else {
            payload.to_vec()
        };
        let wire_len = wire.len() as u64 + 1;

        let framed = self.framed.as_mut().ok_or(ProtocolError::SessionClosed)?;
        with_timeout_error(
            async {
                framed.send(wire).await?;
                Ok::<_, ProtocolError>(())
            },
            self.write_timeout,
        )
        .await?;

        global_metrics().frame_sent(wire_len);
        debug!(bytes = wire_len, encrypted = self.is_encrypted(), "Frame sent");
        Ok(())
    }

    /// Read one frame, opening it when encrypted.
    ///
    /// A frame that fails authentication closes the session before the error
    /// is returned.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        self.ensure_open()?;
        let framed = self.framed.as_mut().ok_or(ProtocolError::SessionClosed)?;
        let frame = with_timeout_error(
            async {
                let frame = framed
                    .next()
                    .await
                    .ok_or(ProtocolError::ConnectionClosed)??;
                Ok::<_, ProtocolError>(frame)
            },
            self.read_timeout,
        )
        .await?;

        global_metrics().frame_received(frame.len() as u64);
        debug!(bytes = frame.len(), encrypted = self.is_encrypted(), "Frame received");

        if !self.is_encrypted() {
            return Ok(frame.to_vec());
        }

        match self.cipher()?.open_base64(&frame) {
            Ok(plain) => Ok(plain),
            Err(ProtocolError::AuthenticationFailure) => {
                global_metrics().authentication_failure();
                warn!(state = %self.state, "Frame failed authentication, abandoning channel");
                self.close().await;
                Err(ProtocolError::AuthenticationFailure)
            }
            Err(e) => Err(e),
        }
    }

    /// Tear the session down. Safe to call any number of times.
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn close(&mut self) {
        let was_open = !self.state.is_closed();
        // only sessions that were counted as opened are counted as closed
        let was_ready = self.is_ready();
        self.state = SessionState::Closed;
        self.cipher = None;
        self.counter = None;

        if let Some(mut framed) = self.framed.take() {
            if let Err(e) = framed.get_mut().shutdown().await {
                debug!(error = %e, "Transport shutdown failed");
            }
        }

        if was_ready {
            global_metrics().session_closed();
        }
        if was_open {
            debug!(peer = ?self.peer, "Session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.state.is_closed() {
            // Dropping the stream closes the socket; no async shutdown here.
            if self.is_ready() {
                global_metrics().session_closed();
            }
            self.framed = None;
            self.cipher = None;
            self.counter = None;
            self.state = SessionState::Closed;
        }
    }
}

/// A session shared between tasks.
///
/// The lock is held for a whole request/response round-trip, so two callers
/// can never interleave their frames or counter values.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Exclusive access for one or more round-trips.
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().await
    }

    pub async fn close(&self) {
        self.inner.lock().await.close().await;
    }
}

impl From<Session> for SharedSession {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}
