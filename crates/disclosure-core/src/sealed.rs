//! Sealed messages between two identities.
//!
//! A message is encrypted under a channel key agreed between the sender's and
//! the recipient's X25519 keys. Both endpoints of the channel can open it; no
//! other identity can. The envelope is CBOR, carried as base64 text.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::crypto::{Keypair, PublicKey};
use crate::error::{CoreError, Result};
use crate::symmetric::{EncryptionKey, EncryptionNonce};

/// Domain for channel key derivation.
const CHANNEL_CONTEXT: &str = "disclosure v1 sealed channel";

/// Format identifier for sealed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SealFormat {
    /// Static X25519 agreement, BLAKE3 channel key, ChaCha20-Poly1305.
    X25519ChaCha20Poly1305 = 1,
}

/// A sealed message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedMessage {
    /// Encryption scheme used.
    pub format: SealFormat,

    /// Nonce used for encryption (unique per message).
    pub nonce: EncryptionNonce,

    /// The encrypted data (includes authentication tag).
    pub ciphertext: Vec<u8>,
}

impl SealedMessage {
    /// Seal `plaintext` from `sender` to `recipient`.
    pub fn seal(sender: &Keypair, recipient: &PublicKey, plaintext: &[u8]) -> Result<Self> {
        let key = channel_key(sender, recipient)
            .ok_or_else(|| CoreError::Encryption("non-contributory key agreement".into()))?;
        let nonce = EncryptionNonce::generate();
        let ciphertext = key.encrypt(plaintext, &nonce)?;

        Ok(Self {
            format: SealFormat::X25519ChaCha20Poly1305,
            nonce,
            ciphertext,
        })
    }

    /// Open a message exchanged with `counterparty`.
    pub fn open(&self, receiver: &Keypair, counterparty: &PublicKey) -> Result<Vec<u8>> {
        match self.format {
            SealFormat::X25519ChaCha20Poly1305 => {
                let key = channel_key(receiver, counterparty).ok_or_else(|| {
                    CoreError::Decryption("non-contributory key agreement".into())
                })?;
                key.decrypt(&self.ciphertext, &self.nonce)
            }
        }
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
    }

    /// Encode as an opaque [`Ciphertext`].
    pub fn to_ciphertext(&self) -> Result<Ciphertext> {
        Ok(Ciphertext(STANDARD.encode(self.to_bytes()?)))
    }

    /// Decode from an opaque [`Ciphertext`].
    pub fn from_ciphertext(ciphertext: &Ciphertext) -> Result<Self> {
        let bytes = STANDARD
            .decode(&ciphertext.0)
            .map_err(|e| CoreError::Decoding(format!("not base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Channel key shared by `own` and `peer`. `None` for a low-order peer key.
fn channel_key(own: &Keypair, peer: &PublicKey) -> Option<EncryptionKey> {
    let shared = own.exchange_secret().diffie_hellman(&peer.exchange_key());
    if !shared.was_contributory() {
        return None;
    }

    let mine = own.public_key();
    let (low, high) = if mine <= *peer {
        (mine, *peer)
    } else {
        (*peer, mine)
    };

    let mut hasher = blake3::Hasher::new_derive_key(CHANNEL_CONTEXT);
    hasher.update(shared.as_bytes());
    hasher.update(&low.to_bytes());
    hasher.update(&high.to_bytes());
    Some(EncryptionKey::from_bytes(*hasher.finalize().as_bytes()))
}

/// Opaque base64 envelope as stored in request records.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ciphertext(pub String);

impl Ciphertext {
    /// Wrap an already-encoded envelope.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} chars)", self.0.len())
    }
}
