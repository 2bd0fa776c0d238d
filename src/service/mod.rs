//! # Client Services
//!
//! The live [`Session`](session::Session), the round resolver seam and the
//! [`Player`](player::Player) command handle.

pub mod player;
pub mod resolver;
pub mod session;
