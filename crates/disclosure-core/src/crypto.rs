//! Key material for disclosure identities.
//!
//! An identity holds two keys derived from one 32-byte seed: an Ed25519 key
//! for signatures and an X25519 key for sealing messages. Its public key is
//! the concatenation of both public halves.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x25519_dalek::{PublicKey as ExchangePublic, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};

/// Salt for passphrase stretching. Fixed so derivation stays deterministic.
const PASSPHRASE_SALT: &[u8] = b"disclosure identity passphrase v1";

/// Domain for the X25519 secret derived from the identity seed.
const EXCHANGE_CONTEXT: &str = "disclosure v1 exchange secret";

/// Domain for the one-way digest of the identity seed.
const DIGEST_CONTEXT: &str = "disclosure v1 secret digest";

/// Length of an encoded public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 64;

/// Argon2id parameters for turning a passphrase into an identity seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Cheap parameters for tests and fixtures. Not for real passphrases.
    pub const fn light() -> Self {
        Self {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// A public key: Ed25519 verifying key followed by X25519 exchange key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicKey {
    signing: [u8; 32],
    exchange: [u8; 32],
}

impl PublicKey {
    /// Parse from the 64-byte wire form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(CoreError::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            )));
        }
        let mut signing = [0u8; 32];
        let mut exchange = [0u8; 32];
        signing.copy_from_slice(&bytes[..32]);
        exchange.copy_from_slice(&bytes[32..]);

        VerifyingKey::from_bytes(&signing)
            .map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;

        Ok(Self { signing, exchange })
    }

    /// The 64-byte wire form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let mut out = [0u8; PUBLIC_KEY_LEN];
        out[..32].copy_from_slice(&self.signing);
        out[32..].copy_from_slice(&self.exchange);
        out
    }

    /// Lowercase hex form (128 chars).
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Parse from hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Check a signature over a message. Never errors: anything malformed is `false`.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.signing) else {
            return false;
        };
        let sig = DalekSignature::from_bytes(&signature.0);
        verifying_key.verify(message, &sig).is_ok()
    }

    /// Address derived from this key.
    pub fn address(&self) -> Address {
        let hash = blake3::hash(&self.to_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash.as_bytes()[..20]);
        Address(out)
    }

    pub(crate) fn exchange_key(&self) -> ExchangePublic {
        ExchangePublic::from(self.exchange)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidSignature(e.to_string()))?;
        let arr: [u8; 64] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| CoreError::InvalidSignature(format!("{} bytes", b.len())))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 20-byte address derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// One-way digest of an identity's secret seed.
///
/// Input to per-field key derivation. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretDigest([u8; 32]);

impl SecretDigest {
    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SecretDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretDigest([REDACTED])")
    }
}

/// Signing and exchange secrets for one identity.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
    exchange_secret: StaticSecret,
    digest: SecretDigest,
    public: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let exchange_secret = StaticSecret::from(blake3::derive_key(EXCHANGE_CONTEXT, seed));
        let digest = SecretDigest(blake3::derive_key(DIGEST_CONTEXT, seed));

        let public = PublicKey {
            signing: signing_key.verifying_key().to_bytes(),
            exchange: *ExchangePublic::from(&exchange_secret).as_bytes(),
        };

        Self {
            signing_key,
            exchange_secret,
            digest,
            public,
        }
    }

    /// Derive a keypair from a passphrase.
    ///
    /// The same passphrase and parameters always yield the same keypair.
    pub fn derive(passphrase: &str, params: &KdfParams) -> Result<Self> {
        let argon_params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(32),
        )
        .map_err(|e| CoreError::KeyDerivation(format!("invalid argon2 params: {e}")))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

        let mut seed = [0u8; 32];
        argon2
            .hash_password_into(passphrase.as_bytes(), PASSPHRASE_SALT, &mut seed)
            .map_err(|e| CoreError::KeyDerivation(e.to_string()))?;

        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        Ok(keypair)
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// One-way digest of the secret seed.
    pub fn secret_digest(&self) -> &SecretDigest {
        &self.digest
    }

    pub(crate) fn exchange_secret(&self) -> &StaticSecret {
        &self.exchange_secret
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public)
    }
}
