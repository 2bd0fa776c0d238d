//! # Utility Modules
//!
//! Supporting utilities for cryptography, logging, timing and metrics.
//!
//! ## Components
//! - **Crypto**: AES-256-GCM sealing with random nonces, base64 helpers
//! - **Logging**: `tracing-subscriber` setup from configuration
//! - **Timeout**: Async timeout wrappers
//! - **Metrics**: Thread-safe observability counters
//!
//! ## Security
//! - Nonces and challenges from the OS CSPRNG (getrandom)
//! - Key material wiped after use (zeroize crate)

pub mod crypto;
pub mod logging;
pub mod metrics;
pub mod timeout;

pub use crypto::Cipher;
