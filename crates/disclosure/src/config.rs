//! Client configuration.

use serde::{Deserialize, Serialize};

use disclosure_core::KdfParams;
use disclosure_perms::AccessContext;

use crate::error::{ClientError, Result};

/// Configuration for the [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin the client acts for. `None` means the identity acts for itself
    /// and may read every field.
    pub origin: Option<String>,
    /// Passphrase stretching parameters.
    pub kdf: KdfParams,
}

impl ClientConfig {
    /// Configuration acting for `origin`.
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Self::default()
        }
    }

    /// Replace the passphrase stretching parameters.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Parse a JSON document. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ClientError::Serialization(e.to_string()))
    }

    /// The permission context for field key derivation.
    pub fn access_context(&self) -> AccessContext {
        AccessContext::from_option(self.origin.clone())
    }
}
