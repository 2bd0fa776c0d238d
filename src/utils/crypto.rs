//! AES-256-GCM sealing for the game channel.
//!
//! A sealed unit is `nonce(12) || ciphertext || tag(16)`. The nonce comes
//! from the OS CSPRNG on every call; it is never derived from the packet
//! counter. On the wire the unit travels as unpadded standard base64.

use crate::error::{constants, ProtocolError, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use std::fmt;
use zeroize::Zeroize;

/// Length of the symmetric key in bytes.
pub const KEY_LEN: usize = 32;
/// Length of the per-message nonce in bytes.
pub const NONCE_LEN: usize = 12;
/// Length of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

#[derive(Clone)]
pub struct Cipher {
    aead: Aes256Gcm,
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            aead: Aes256Gcm::new(key.into()),
        }
    }

    /// Build from raw key bytes of any length; only 32 bytes are accepted.
    pub fn from_slice(key: &[u8]) -> Result<Self> {
        let aead = Aes256Gcm::new_from_slice(key)
            .map_err(|_| ProtocolError::ResolverError(constants::ERR_KEY_LENGTH.into()))?;
        Ok(Self { aead })
    }

    /// Build from the base64 key handed out by the round resolver.
    ///
    /// Padded and unpadded standard base64 are both accepted. The decoded key
    /// bytes are wiped once the cipher holds them.
    pub fn from_base64(key: &str) -> Result<Self> {
        let mut raw = STANDARD
            .decode(key.trim())
            .or_else(|_| STANDARD_NO_PAD.decode(key.trim()))
            .map_err(|e| ProtocolError::ResolverError(format!("invalid key encoding: {e}")))?;
        let cipher = Self::from_slice(&raw);
        raw.zeroize();
        cipher
    }

    /// Fresh nonce from the operating system's CSPRNG.
    pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
        let mut nonce = [0u8; NONCE_LEN];
        getrandom::fill(&mut nonce).map_err(|_| ProtocolError::EncryptionFailure)?;
        Ok(nonce)
    }

    /// Encrypt `plaintext` and prepend the nonce used.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = Self::generate_nonce()?;
        let ciphertext = self
            .aead
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| ProtocolError::EncryptionFailure)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        nonce.zeroize();
        Ok(sealed)
    }

    /// Split off the nonce, verify the tag and return the plaintext.
    ///
    /// Any failure, including input too short to hold a nonce and a tag, is
    /// reported as [`ProtocolError::AuthenticationFailure`].
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(ProtocolError::AuthenticationFailure);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ProtocolError::AuthenticationFailure)
    }

    pub fn seal_base64(&self, plaintext: &[u8]) -> Result<String> {
        Ok(STANDARD_NO_PAD.encode(self.seal(plaintext)?))
    }

    pub fn open_base64(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let sealed = STANDARD_NO_PAD.decode(encoded)?;
        self.open(&sealed)
    }
}
