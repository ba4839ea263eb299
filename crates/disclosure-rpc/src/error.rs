//! Error types for the RPC module.

use disclosure_core::TransportError;
use disclosure_perms::PermsError;
use disclosure_store::StoreError;
use thiserror::Error;

use crate::messages::RpcErrorCode;

/// Errors raised while serving or decoding an RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// No handler for this method.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Parameters did not match the method.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// A wire record could not be converted.
    #[error("invalid wire record: {0}")]
    Wire(String),

    /// Store operation failed on the serving side.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Site lookup failed on the serving side.
    #[error("site error: {0}")]
    Perms(#[from] PermsError),

    /// Transport-level error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RpcError {
    /// The code sent to the caller for this error.
    pub fn code(&self) -> RpcErrorCode {
        match self {
            RpcError::UnknownMethod(_) => RpcErrorCode::MethodNotFound,
            RpcError::InvalidParams(_) | RpcError::Wire(_) => RpcErrorCode::InvalidParams,
            RpcError::Store(StoreError::InvalidTransition(_)) => RpcErrorCode::InvalidTransition,
            RpcError::Perms(PermsError::SiteNotFound(_)) => RpcErrorCode::SiteNotFound,
            RpcError::Store(_) | RpcError::Perms(_) | RpcError::Transport(_) => {
                RpcErrorCode::Internal
            }
        }
    }

    /// How the caller sees this error.
    pub fn into_transport_error(self) -> TransportError {
        match self {
            RpcError::Transport(e) => e,
            other => TransportError::Remote {
                code: other.code().as_i64(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;
