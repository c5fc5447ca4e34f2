//! AEAD envelope codec.
//!
//! Seals structured parameter bundles that travel through an untrusted client
//! round-trip: upload descriptors, bot-challenge payloads, ceremony state,
//! opaque avatar object keys. Wire format is
//! `base64(nonce(12) || ciphertext || tag(16))` under AES-256-GCM.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::anyhow;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AccountServiceError;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Server envelope secret. Cheap to clone; safe to share across requests.
#[derive(Clone)]
pub struct EnvelopeKey {
    cipher: Aes256Gcm,
}

impl EnvelopeKey {
    /// Build from the 32-byte server secret.
    pub fn new(secret: &[u8]) -> anyhow::Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(secret)
            .map_err(|_| anyhow!("envelope secret must be exactly 32 bytes"))?;
        Ok(Self { cipher })
    }

    pub fn seal_bytes(&self, plaintext: &[u8]) -> Result<String, AccountServiceError> {
        // Nonce must be fresh random per call; a repeat under the same key
        // breaks both confidentiality and authenticity.
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| AccountServiceError::Internal(anyhow!("aead encryption failure")))?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(nonce.as_slice());
        raw.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(raw))
    }

    /// Open an envelope. Every failure mode (base64, truncation, tag) maps to
    /// the single `InvalidEnvelope` kind so errors carry no oracle.
    pub fn open_bytes(&self, envelope: &str) -> Result<Vec<u8>, AccountServiceError> {
        let raw = STANDARD
            .decode(envelope)
            .map_err(|_| AccountServiceError::InvalidEnvelope)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(AccountServiceError::InvalidEnvelope);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AccountServiceError::InvalidEnvelope)
    }

    pub fn seal_str(&self, plaintext: &str) -> Result<String, AccountServiceError> {
        self.seal_bytes(plaintext.as_bytes())
    }

    pub fn open_str(&self, envelope: &str) -> Result<String, AccountServiceError> {
        let bytes = self.open_bytes(envelope)?;
        String::from_utf8(bytes).map_err(|_| AccountServiceError::InvalidEnvelope)
    }

    pub fn seal_json<T: Serialize>(&self, value: &T) -> Result<String, AccountServiceError> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| AccountServiceError::Internal(e.into()))?;
        self.seal_bytes(&bytes)
    }

    pub fn open_json<T: DeserializeOwned>(
        &self,
        envelope: &str,
    ) -> Result<T, AccountServiceError> {
        let bytes = self.open_bytes(envelope)?;
        serde_json::from_slice(&bytes).map_err(|_| AccountServiceError::InvalidEnvelope)
    }
}
