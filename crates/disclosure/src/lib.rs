//! # Disclosure
//!
//! Selective disclosure of encrypted profile data.
//!
//! ## Overview
//!
//! Every profile field is encrypted under its own key, derived from the
//! owner's secret and the field name. Reading a field means deriving its
//! key, and deriving is gated by permission:
//!
//! - **Owner**: an identity acting for itself may derive every key
//! - **Confidential site**: a trusted origin may derive every key
//! - **Other sites**: only the fields named in accepted grant records
//!
//! Fields move between identities through data requests. A requester asks
//! for field names, the owner accepts with the derived keys or rejects, and
//! the requester decrypts the fields it was given. Grants skip the request
//! and disclose keys directly.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use disclosure::{Client, ClientConfig, ProfileData};
//! use disclosure::core::LocalIdentity;
//! use disclosure::perms::SiteDataSource;
//! use disclosure::store::SqliteStore;
//!
//! async fn example(sites: Arc<dyn SiteDataSource>) -> disclosure::Result<()> {
//!     let store = Arc::new(SqliteStore::open("profile.db")?);
//!     let alice = Client::local(
//!         Arc::new(LocalIdentity::generate()),
//!         store,
//!         sites,
//!         ClientConfig::default(),
//!     );
//!
//!     let mut values = ProfileData::new();
//!     values.insert("email".into(), "alice@example.com".into());
//!     alice.profile().update_data(&values).await?;
//!
//!     let own = alice.profile().get_data(&alice.public_key()).await?;
//!     assert_eq!(own["email"], "alice@example.com");
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `disclosure::core` - keys, identities, ciphers and request records
//! - `disclosure::perms` - sites, permissions and field key derivation
//! - `disclosure::store` - storage traits, memory and SQLite backends
//! - `disclosure::rpc` - transport capability and RPC adapters

pub mod client;
pub mod config;
pub mod error;
pub mod grants;
pub mod profile;
pub mod requests;

// Re-export component crates
pub use disclosure_core as core;
pub use disclosure_perms as perms;
pub use disclosure_rpc as rpc;
pub use disclosure_store as store;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use grants::StoreGrantSource;
pub use profile::{ProfileData, ProfileStore};
pub use requests::DataRequestWorkflow;

// Commonly used types
pub use disclosure_core::{
    Ciphertext, DataRequest, Identity, KdfParams, LocalIdentity, OfferId, PublicKey, RequestId,
    RequestState, TransportError,
};
pub use disclosure_perms::{AccessContext, GrantedKeys, Site};
