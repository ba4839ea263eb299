//! Error types for the client.

use disclosure_core::{Address, CoreError, RequestId, RequestState, TransportError};
use disclosure_perms::PermsError;
use disclosure_store::StoreError;
use thiserror::Error;

/// Errors that can occur during client operations.
///
/// A field the caller may not read is not an error. It is simply absent
/// from results.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Ciphertext not addressed to this identity, or corrupted.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Unknown request id.
    #[error("request not found: {0}")]
    NotFound(RequestId),

    /// Transition attempted on a terminal record.
    #[error("request {id} is already {state}")]
    InvalidState { id: RequestId, state: RequestState },

    /// The acting identity is not the one the request is addressed to.
    #[error("request {0} is not addressed to this identity")]
    NotAddressee(RequestId),

    /// A response named someone other than the original requester.
    #[error("request {id} was made by {requester}, not {given}")]
    RequesterMismatch {
        id: RequestId,
        requester: Address,
        given: Address,
    },

    /// Connectivity failure, unmodified from the transport.
    #[error(transparent)]
    Transport(TransportError),

    /// A request listing named neither endpoint.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(StoreError),

    /// Permission resolution error.
    #[error("permission error: {0}")]
    Permission(PermsError),

    /// Payload or configuration could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Key or cipher error.
    #[error("core error: {0}")]
    Core(CoreError),
}

impl From<CoreError> for ClientError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Decryption(message) => ClientError::Decryption(message),
            CoreError::InvalidQuery(message) => ClientError::InvalidQuery(message),
            other => ClientError::Core(other),
        }
    }
}

impl From<StoreError> for ClientError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Transport(t) => ClientError::Transport(t),
            other => ClientError::Store(other),
        }
    }
}

impl From<PermsError> for ClientError {
    fn from(e: PermsError) -> Self {
        match e {
            PermsError::Transport(t) => ClientError::Transport(t),
            PermsError::Core(core) => core.into(),
            other => ClientError::Permission(other),
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        ClientError::Transport(e)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
