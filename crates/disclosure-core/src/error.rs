//! Error types for the core primitives.

use thiserror::Error;

/// Errors raised by key handling and the cipher primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    /// The ciphertext was not produced for this key (or channel) or it was tampered with.
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Connectivity failures reported by a transport collaborator.
///
/// The core never builds these itself except when adapting a transport;
/// callers see them unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport disconnected")]
    Disconnected,

    #[error("timeout: {0}")]
    Timeout(String),

    /// The remote end answered with an error.
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// The remote answer could not be interpreted.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
