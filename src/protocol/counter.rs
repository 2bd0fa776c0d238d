//! Packet counter guard.
//!
//! Once the channel is encrypted, client and server both track a `u32`
//! counter. Every request carries the next value and the response must echo
//! it. Anything else means a replayed, reordered or dropped packet.

use crate::error::{constants, ProtocolError, Result};
use crate::protocol::state::SessionState;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCounter {
    value: u32,
}

impl PacketCounter {
    /// Adopt the server's `initialpc` verbatim.
    pub fn from_initial(initial: u32) -> Self {
        Self { value: initial }
    }

    /// The last value sent (or the baseline if nothing was sent yet).
    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Step to the value the next outgoing request must carry.
    pub fn advance(&mut self, stage: SessionState) -> Result<u32> {
        let current = self.value;
        self.value = current.checked_add(1).ok_or_else(|| {
            ProtocolError::violation(stage, constants::ERR_PC_EXHAUSTED, "< u32::MAX", current)
        })?;
        Ok(self.value)
    }

    /// Give back the value of a request the server answered without
    /// counting it (a rejection or a packet of another type).
    pub fn rewind(&mut self) {
        self.value = self.value.saturating_sub(1);
    }

    /// Check that a response echoes the value of the request in flight.
    pub fn verify(&self, stage: SessionState, received: Option<u32>) -> Result<()> {
        match received {
            None => {
                warn!(expected = self.value, %stage, "Response without pc");
                Err(ProtocolError::violation(
                    stage,
                    constants::ERR_MISSING_PC,
                    self.value,
                    "none",
                ))
            }
            Some(pc) if pc != self.value => {
                warn!(expected = self.value, received = pc, %stage, "Counter mismatch");
                Err(ProtocolError::violation(
                    stage,
                    constants::ERR_PC_MISMATCH,
                    self.value,
                    pc,
                ))
            }
            Some(_) => Ok(()),
        }
    }
}
