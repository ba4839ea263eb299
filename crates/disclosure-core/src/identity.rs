//! The identity capability.
//!
//! Everything above this crate talks to an identity through [`Identity`]
//! and never touches key material directly. [`LocalIdentity`] is the
//! in-process implementation backed by a [`Keypair`].

use crate::crypto::{Address, KdfParams, Keypair, PublicKey, SecretDigest, Signature};
use crate::error::{CoreError, Result};
use crate::sealed::{Ciphertext, SealedMessage};

/// Signing, sealing and key facts for one identity.
pub trait Identity: Send + Sync {
    /// The identity's public key.
    fn public_key(&self) -> PublicKey;

    /// Address derived from the public key.
    fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Sign arbitrary data.
    fn sign(&self, data: &[u8]) -> Signature;

    /// Check a signature made by `public_key`. Never fails; mismatch is `false`.
    fn verify(&self, data: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
        public_key.verify(data, signature)
    }

    /// Seal `plaintext` for `recipient`.
    fn encrypt_to(&self, recipient: &PublicKey, plaintext: &[u8]) -> Result<Ciphertext>;

    /// Open a ciphertext exchanged with `sender`.
    ///
    /// Fails with [`CoreError::Decryption`](crate::CoreError::Decryption) when
    /// the ciphertext was not sealed on this identity's channel or was altered.
    fn decrypt_from(&self, sender: &PublicKey, ciphertext: &Ciphertext) -> Result<Vec<u8>>;

    /// One-way digest of the private key, input to field key derivation.
    fn secret_digest(&self) -> SecretDigest;
}

/// An identity whose keys live in this process.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    keypair: Keypair,
}

impl LocalIdentity {
    /// Wrap an existing keypair.
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Derive from a passphrase. Deterministic for a given passphrase and parameters.
    pub fn derive(passphrase: &str, params: &KdfParams) -> Result<Self> {
        Ok(Self::new(Keypair::derive(passphrase, params)?))
    }

    /// A fresh random identity.
    pub fn generate() -> Self {
        Self::new(Keypair::generate())
    }
}

impl Identity for LocalIdentity {
    fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    fn sign(&self, data: &[u8]) -> Signature {
        self.keypair.sign(data)
    }

    fn encrypt_to(&self, recipient: &PublicKey, plaintext: &[u8]) -> Result<Ciphertext> {
        SealedMessage::seal(&self.keypair, recipient, plaintext)?.to_ciphertext()
    }

    fn decrypt_from(&self, sender: &PublicKey, ciphertext: &Ciphertext) -> Result<Vec<u8>> {
        SealedMessage::from_ciphertext(ciphertext)
            .map_err(|e| CoreError::Decryption(e.to_string()))?
            .open(&self.keypair, sender)
    }

    fn secret_digest(&self) -> SecretDigest {
        self.keypair.secret_digest().clone()
    }
}
