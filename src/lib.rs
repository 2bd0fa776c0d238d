//! # arena-client
//!
//! Client side of an encrypted, counter-verified session with a real-time
//! arena game server.
//!
//! A session is established from a short-lived authorization token:
//! the token resolves to a ticket, an AES-256 key and the server address;
//! the client logs in, proves key possession in both directions with a
//! sealed challenge, adopts the server's packet counter and from then on
//! exchanges one sealed JSON command per round-trip.
//!
//! ## Modules
//! - [`core`]: newline framing and the packet envelope
//! - [`protocol`]: handshake, packet counter guard, request correlation
//! - [`service`]: session, round resolver, player commands
//! - [`utils`]: AES-GCM cipher, timeouts, logging, metrics
//!
//! ## Example
//! ```no_run
//! use arena_client::config::GameConfig;
//! use arena_client::service::player::Angle;
//! use arena_client::service::resolver::{RoundInfo, StaticResolver};
//!
//! # async fn run(info: RoundInfo) -> arena_client::error::Result<()> {
//! let resolver = StaticResolver::new(info);
//! let mut session = arena_client::join("token", &resolver, &GameConfig::default()).await?;
//! session.player().rotate(Angle::Left).await?;
//! let health = session.player().health().await?;
//! tracing::info!(health, "still alive");
//! session.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod utils;

pub use error::{ProtocolError, Result};
pub use protocol::handshake::join;
pub use protocol::state::SessionState;
pub use service::player::{Angle, Direction, Player};
pub use service::resolver::{RoundInfo, RoundResolver, StaticResolver};
pub use service::session::{Session, SharedSession};
