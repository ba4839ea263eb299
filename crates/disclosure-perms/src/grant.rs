//! Grant payloads.
//!
//! The plaintext of a response or grant is a JSON object mapping each
//! disclosed field name to its field key in hex. Requests carry a plain
//! JSON array of field names.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use disclosure_core::FieldKey;

use crate::error::{PermsError, Result};

/// Field name to field key (hex), as disclosed to a counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantedKeys(BTreeMap<String, String>);

impl GrantedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the key for a field.
    pub fn insert(&mut self, field_name: impl Into<String>, key: &FieldKey) {
        self.0.insert(field_name.into(), key.to_hex());
    }

    /// The key for `field_name`, if one was disclosed.
    ///
    /// Names compare case-insensitively. An empty entry is the "no access"
    /// sentinel and yields `None`.
    pub fn key(&self, field_name: &str) -> Result<Option<FieldKey>> {
        let hex = self.0.get(field_name).or_else(|| {
            let wanted = field_name.to_lowercase();
            self.0
                .iter()
                .find(|(name, _)| name.to_lowercase() == wanted)
                .map(|(_, hex)| hex)
        });

        match hex {
            None => Ok(None),
            Some(hex) if hex.is_empty() => Ok(None),
            Some(hex) => Ok(Some(FieldKey::from_hex(hex)?)),
        }
    }

    /// Disclosed field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as the JSON plaintext of a response.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.0).map_err(|e| PermsError::InvalidGrant(e.to_string()))
    }

    /// Decode the JSON plaintext of a response.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| PermsError::InvalidGrant(e.to_string()))
    }
}

/// Encode a field-name list as request plaintext.
pub fn encode_field_names<S: AsRef<str>>(fields: &[S]) -> Result<Vec<u8>> {
    let names: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
    serde_json::to_vec(&names).map_err(|e| PermsError::InvalidGrant(e.to_string()))
}

/// Field names carried by a decrypted payload.
///
/// Accepts either a JSON array of names or a JSON object keyed by name.
pub fn granted_field_names(payload: &[u8]) -> Result<BTreeSet<String>> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| PermsError::InvalidGrant(e.to_string()))?;

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(name),
                other => Err(PermsError::InvalidGrant(format!(
                    "field name must be a string, got {other}"
                ))),
            })
            .collect(),
        Value::Object(map) => Ok(map.into_iter().map(|(name, _)| name).collect()),
        other => Err(PermsError::InvalidGrant(format!(
            "expected a list or map of fields, got {other}"
        ))),
    }
}
