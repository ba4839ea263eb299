//! Error types for permission resolution.

use disclosure_core::{CoreError, TransportError};
use thiserror::Error;

/// Errors that can occur while resolving permissions.
///
/// A field the caller may not read is not an error; see
/// [`FieldKeyDerivation::generate_field_key`](crate::FieldKeyDerivation::generate_field_key).
#[derive(Debug, Error)]
pub enum PermsError {
    /// The site data source knows nothing about this origin.
    #[error("site not found: {0}")]
    SiteNotFound(String),

    /// A collaborator failed for a reason other than connectivity.
    #[error("source error: {0}")]
    Source(String),

    /// Grant payload could not be interpreted.
    #[error("invalid grant payload: {0}")]
    InvalidGrant(String),

    /// Connectivity failure, passed through unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
