//! Error types for the store module.

use disclosure_core::{RequestState, TransportError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A transition to a state that can never be entered from `AWAIT`.
    #[error("cannot transition a request to {0}")]
    InvalidTransition(RequestState),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing store is remote and unreachable.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
