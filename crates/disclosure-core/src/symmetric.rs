//! Symmetric encryption for profile field values.
//!
//! A field value is encrypted with ChaCha20-Poly1305 under a key derived from
//! its [`FieldKey`]. The stored form is `base64(nonce || ciphertext)`, with a
//! fresh random nonce per call.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

/// Domain for turning a 384-bit field key into a cipher key.
const FIELD_CIPHER_CONTEXT: &str = "disclosure v1 field cipher";

/// Length of a field key in bytes (384 bits).
pub const FIELD_KEY_LEN: usize = 48;

/// Length of a ChaCha20-Poly1305 nonce.
pub const NONCE_LEN: usize = 12;

/// A 256-bit symmetric encryption key for ChaCha20-Poly1305.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encrypt data with this key.
    pub fn encrypt(&self, plaintext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::Encryption(e.to_string()))?;

        cipher
            .encrypt(Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|e| CoreError::Encryption(e.to_string()))
    }

    /// Decrypt data with this key.
    pub fn decrypt(&self, ciphertext: &[u8], nonce: &EncryptionNonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| CoreError::Decryption(e.to_string()))?;

        cipher
            .decrypt(Nonce::from_slice(&nonce.0), ciphertext)
            .map_err(|_| CoreError::Decryption("authentication failed".into()))
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionNonce(pub [u8; NONCE_LEN]);

impl EncryptionNonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// Per-field key: a pure function of the owner's secret and the field name.
///
/// Never persisted. The hex form is what travels inside responses and grants.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct FieldKey([u8; FIELD_KEY_LEN]);

impl FieldKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; FIELD_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; FIELD_KEY_LEN] {
        &self.0
    }

    /// Lowercase hex form (96 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::Decoding(e.to_string()))?;
        let arr: [u8; FIELD_KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CoreError::Decoding(format!(
                "field key must be {} bytes, got {}",
                FIELD_KEY_LEN,
                b.len()
            ))
        })?;
        Ok(Self(arr))
    }

    fn cipher_key(&self) -> EncryptionKey {
        EncryptionKey(blake3::derive_key(FIELD_CIPHER_CONTEXT, &self.0))
    }

    /// Encrypt a field value. Every call uses a fresh nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let nonce = EncryptionNonce::generate();
        let ciphertext = self.cipher_key().encrypt(plaintext.as_bytes(), &nonce)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_bytes());
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    /// Decrypt a value produced by [`FieldKey::seal`].
    pub fn open(&self, sealed: &str) -> Result<String> {
        let raw = STANDARD
            .decode(sealed)
            .map_err(|e| CoreError::Decryption(format!("not base64: {e}")))?;
        if raw.len() < NONCE_LEN {
            return Err(CoreError::Decryption("ciphertext too short".into()));
        }

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&raw[..NONCE_LEN]);
        let plaintext = self
            .cipher_key()
            .decrypt(&raw[NONCE_LEN..], &EncryptionNonce(nonce))?;

        String::from_utf8(plaintext).map_err(|e| CoreError::Decryption(e.to_string()))
    }
}

impl fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldKey([REDACTED])")
    }
}
