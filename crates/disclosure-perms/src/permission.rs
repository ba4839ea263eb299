//! Resolved permissions.
//!
//! A [`Permission`] is an immutable set of readable field names plus a
//! wildcard flag. Only [`Permission::wildcard`] sets the flag; no field
//! name, whatever its spelling, widens a permission beyond itself. Field
//! names compare case-insensitively, as field keys do.

use std::collections::BTreeSet;

/// Who is asking for field keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccessContext {
    /// The identity acting for itself; every field is readable.
    Owner,
    /// A site acting on the identity's behalf.
    Origin(String),
}

impl AccessContext {
    /// Context for a site origin.
    pub fn origin(origin: impl Into<String>) -> Self {
        Self::Origin(origin.into())
    }

    /// `None` means the owner context.
    pub fn from_option(origin: Option<String>) -> Self {
        origin.map_or(Self::Owner, Self::Origin)
    }
}

/// Field names readable in one (identity, origin) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Permission {
    fields: BTreeSet<String>,
    wildcard: bool,
}

impl Permission {
    /// No readable fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every field readable.
    pub fn wildcard() -> Self {
        Self {
            fields: BTreeSet::new(),
            wildcard: true,
        }
    }

    /// Exactly these fields.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|f| f.as_ref().to_lowercase())
                .collect(),
            wildcard: false,
        }
    }

    /// Whether this permission admits every field.
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Whether `field_name` may be read.
    pub fn allows(&self, field_name: &str) -> bool {
        self.is_wildcard() || self.fields.contains(&field_name.to_lowercase())
    }

    /// The stored field names, lowercased.
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Number of stored field names. Zero for a bare wildcard.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether nothing at all may be read.
    pub fn is_empty(&self) -> bool {
        !self.wildcard && self.fields.is_empty()
    }

    /// Union of two permissions.
    pub fn union(&self, other: &Permission) -> Permission {
        Permission {
            fields: self.fields.union(&other.fields).cloned().collect(),
            wildcard: self.wildcard || other.wildcard,
        }
    }
}
