//! The `{type, pc, obj, error}` envelope shared by every packet.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Packet type names used by the session itself.
pub mod kinds {
    pub const LOGIN: &str = "login";
    pub const CLIENT_HELLO: &str = "clienthello";
    pub const SERVER_HELLO: &str = "serverhello";
    pub const INITIAL_PC: &str = "initialpc";
    pub const AGREE_CONN: &str = "agreeconn";

    /// Types under which the server reports a rejected packet.
    pub const UNKNOWN: &str = "unknown";
    pub const FORBIDDEN: &str = "forbidden";
}

/// Prefixes of the challenge strings exchanged during the hello round.
pub const CLIENT_HELLO_PREFIX: &str = "clienthello:";
pub const SERVER_HELLO_PREFIX: &str = "serverhello:";

/// Generic envelope. `obj` defaults to raw JSON so the correlator can check
/// type and counter before a command decodes its own payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pc: Option<u32>,

    pub obj: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn new(kind: impl Into<String>, pc: Option<u32>, obj: Option<T>) -> Self {
        Self {
            kind: kind.into(),
            pc,
            obj,
            error: None,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn to_bytes(&self) -> crate::error::Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| crate::error::ProtocolError::SerializeError(e.to_string()))
    }
}

/// `obj` of the `login` packet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginBody {
    pub roundticket: String,
}

/// `obj` of both hello packets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HelloBody {
    #[serde(default)]
    pub cipher: Option<String>,
}

/// `{}`: an empty object, as opposed to `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
