//! # Disclosure Core
//!
//! Pure primitives for selective disclosure of profile data.
//!
//! This crate performs no I/O. It holds the key material, the two ciphers
//! and the request record model that the other crates build on.
//!
//! ## Key Types
//!
//! - [`Identity`] - capability to sign, verify, seal and open messages
//! - [`LocalIdentity`] - in-process identity derived from a passphrase
//! - [`PublicKey`] - Ed25519 verifying key plus X25519 exchange key
//! - [`SealedMessage`] / [`Ciphertext`] - messages readable only by the two channel endpoints
//! - [`FieldKey`] - per-field symmetric key; [`FieldKey::seal`] encrypts profile values
//! - [`DataRequest`] / [`RequestState`] - request records and their state machine

pub mod crypto;
pub mod error;
pub mod identity;
pub mod request;
pub mod sealed;
pub mod symmetric;
pub mod types;

pub use crypto::{Address, KdfParams, Keypair, PublicKey, SecretDigest, Signature};
pub use error::{CoreError, Result, TransportError};
pub use identity::{Identity, LocalIdentity};
pub use request::{DataRequest, NewRequest, RequestFilter, RequestState};
pub use sealed::{Ciphertext, SealFormat, SealedMessage};
pub use symmetric::{EncryptionKey, EncryptionNonce, FieldKey, FIELD_KEY_LEN};
pub use types::{OfferId, RequestId};
