//! # Core Wire Components
//!
//! Framing and the packet envelope, independent of session state.
//!
//! ## Components
//! - **Codec**: newline-delimited Tokio codec with a frame length cap
//! - **Envelope**: the `{type, pc, obj, error}` JSON wrapper of every packet
//!
//! ## Wire Format
//! ```text
//! plain:     {"type":...,"pc":...,"obj":...}\n
//! encrypted: base64_nopad(nonce(12) || AES-256-GCM(json))\n
//! ```

pub mod codec;
pub mod envelope;
