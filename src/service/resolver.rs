//! Round resolution seam.
//!
//! The game API exchanges an authorization token for a ticket, a symmetric
//! key and the server address. How that lookup is performed (HTTPS in
//! production) is up to the caller; the session only needs a
//! [`RoundResolver`] that yields a [`RoundInfo`].

use crate::error::{constants, ProtocolError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Connection coordinates for one round. Consumed once by `join`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundInfo {
    pub ticket: String,
    /// Base64 of the 32-byte AES key
    pub aes_key: String,
    pub ipv4: String,
    pub ipv6: String,
    pub port: u16,
    pub error: Option<String>,
}

impl std::fmt::Debug for RoundInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundInfo")
            .field("ticket", &self.ticket)
            .field("aes_key", &"<redacted>")
            .field("ipv4", &self.ipv4)
            .field("ipv6", &self.ipv6)
            .field("port", &self.port)
            .field("error", &self.error)
            .finish()
    }
}

impl RoundInfo {
    /// Parse a raw resolver response body.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| ProtocolError::ResolverError(format!("malformed round information: {e}")))
    }

    /// Surface a resolver-side `error` field.
    pub fn check(self) -> Result<Self> {
        match &self.error {
            Some(err) if !err.is_empty() => Err(ProtocolError::ResolverError(err.clone())),
            _ => Ok(self),
        }
    }

    /// `host:port` to dial; IPv4 preferred, IPv6 bracketed as fallback.
    pub fn address(&self) -> Result<String> {
        if !self.ipv4.is_empty() {
            Ok(format!("{}:{}", self.ipv4, self.port))
        } else if !self.ipv6.is_empty() {
            Ok(format!("[{}]:{}", self.ipv6, self.port))
        } else {
            Err(ProtocolError::ResolverError(constants::ERR_NO_ADDRESS.into()))
        }
    }
}

#[async_trait]
pub trait RoundResolver: Send + Sync {
    async fn resolve(&self, authtoken: &str) -> Result<RoundInfo>;
}

/// Hands out the same round information for every token.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    info: RoundInfo,
}

impl StaticResolver {
    pub fn new(info: RoundInfo) -> Self {
        Self { info }
    }
}

#[async_trait]
impl RoundResolver for StaticResolver {
    async fn resolve(&self, _authtoken: &str) -> Result<RoundInfo> {
        Ok(self.info.clone())
    }
}
