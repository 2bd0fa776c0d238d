//! Request/response correlation.
//!
//! Every packet after `login` goes through here: one request out, one
//! response in, checked for type, server errors and the packet counter
//! before the raw payload is handed to the caller.

use crate::core::envelope::{kinds, Envelope};
use crate::error::{constants, ProtocolError, Result};
use crate::service::session::Session;
use crate::utils::metrics::global_metrics;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, instrument, warn};

impl Session {
    /// Serialize and send `{type, pc, obj}`.
    ///
    /// Once the counter is synchronised it is advanced first and the new
    /// value travels with the packet. Returns the value sent, if any.
    #[instrument(skip(self, body), fields(state = %self.state))]
    pub async fn send_command<B: Serialize>(&mut self, kind: &str, body: Option<B>) -> Result<Option<u32>> {
        self.ensure_open()?;
        let pc = match self.counter.as_mut() {
            Some(counter) => Some(counter.advance(self.state)?),
            None => None,
        };

        let bytes = Envelope::new(kind, pc, body).to_bytes()?;
        self.write_frame(&bytes).await?;
        if self.is_ready() {
            global_metrics().command_sent();
        }
        debug!(?pc, "Command sent");
        Ok(pc)
    }

    /// Read one response and validate it against `expected`.
    ///
    /// - a different type carrying an `error` under `unknown`/`forbidden` is a
    ///   [`ProtocolError::ServerRejection`]; any other different type is an
    ///   `unexpected packet` violation. Either way the counter value of the
    ///   request is given back
    /// - with a synchronised counter, `pc` must equal the value just sent;
    ///   otherwise the session is closed and never resynchronised
    #[instrument(skip(self), fields(state = %self.state))]
    pub async fn recv_and_validate(&mut self, expected: &str) -> Result<Vec<u8>> {
        let payload = self.read_frame().await?;
        let header: Envelope<IgnoredAny> = serde_json::from_slice(&payload)?;

        if header.kind != expected {
            // the server only counts packets it answers under their own type
            if let Some(counter) = self.counter.as_mut() {
                counter.rewind();
            }
            if let Some(message) = header.error {
                if header.kind == kinds::UNKNOWN || header.kind == kinds::FORBIDDEN {
                    global_metrics().server_rejection();
                    return Err(ProtocolError::ServerRejection {
                        kind: header.kind,
                        message,
                    });
                }
            }
            return Err(ProtocolError::violation(
                self.state,
                constants::ERR_UNEXPECTED_PACKET,
                expected,
                header.kind,
            ));
        }

        if let Some(counter) = self.counter {
            if let Err(err) = counter.verify(self.state, header.pc) {
                global_metrics().counter_violation();
                warn!(error = %err, "Closing session after counter violation");
                self.close().await;
                return Err(err);
            }
        }

        Ok(payload)
    }

    /// One round-trip returning the raw response payload.
    pub async fn exchange<B: Serialize>(&mut self, kind: &str, body: Option<B>) -> Result<Vec<u8>> {
        self.send_command(kind, body).await?;
        self.recv_and_validate(kind).await
    }

    /// One round-trip decoding the response `obj` as `R`.
    ///
    /// A top-level `error` on an otherwise valid response is surfaced as a
    /// [`ProtocolError::ServerRejection`].
    pub async fn request<B, R>(&mut self, kind: &str, body: Option<B>) -> Result<Option<R>>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let payload = self.exchange(kind, body).await?;
        let response: Envelope<R> = serde_json::from_slice(&payload)?;
        if let Some(message) = response.error {
            global_metrics().server_rejection();
            return Err(ProtocolError::ServerRejection {
                kind: response.kind,
                message,
            });
        }
        Ok(response.obj)
    }
}
