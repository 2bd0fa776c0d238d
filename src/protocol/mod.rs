//! # Session Protocol
//!
//! The handshake state machine, the packet counter guard and the
//! request/response correlator that every command goes through.

pub mod correlator;
pub mod counter;
pub mod handshake;
pub mod state;

pub use handshake::join;
pub use state::SessionState;
