//! # Disclosure Permissions
//!
//! Decides which fields of an identity's profile a requesting site may read,
//! and derives the per-field keys that unlock them.
//!
//! ## Overview
//!
//! A site is described by a [`SiteDataSource`]. Confidential sites read
//! everything. Other sites read the union of the fields named in the
//! accepted grant records the identity has issued to them, as listed by a
//! [`PermissionsSource`].
//!
//! [`PermissionResolver`] computes and caches the [`Permission`] for each
//! (identity, origin) pair. [`FieldKeyDerivation`] consults it before
//! deriving a [`FieldKey`](disclosure_core::FieldKey).
//!
//! ## Key Derivation
//!
//! Field keys are the blake3 XOF in derive-key mode over the identity's
//! secret digest and the lowercased field name. The same identity and field
//! always give the same key, in any context that is allowed to see it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use disclosure_perms::{AccessContext, FieldKeyDerivation, PermissionResolver};
//!
//! // let resolver = Arc::new(PermissionResolver::new(sites, grants));
//! // let keys = FieldKeyDerivation::new(resolver, AccessContext::origin("https://shop.example"));
//! // let key = keys.generate_field_key(&identity, "email").await?;
//! ```

pub mod error;
pub mod field_key;
pub mod grant;
pub mod permission;
pub mod resolver;
pub mod site;

pub use error::{PermsError, Result};
pub use field_key::{derive_field_key, FieldKeyDerivation};
pub use grant::{encode_field_names, granted_field_names, GrantedKeys};
pub use permission::{AccessContext, Permission};
pub use resolver::PermissionResolver;
pub use site::{PermissionsSource, Site, SiteDataSource};
