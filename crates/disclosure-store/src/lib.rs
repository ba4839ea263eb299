//! # Disclosure Store
//!
//! Storage abstraction for data requests and encrypted profiles. Provides
//! trait-based interfaces with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The workflow talks to persistence only through [`RequestStore`] and
//! [`ProfileRepository`]. The primary implementation is [`SqliteStore`],
//! with [`MemoryStore`] for testing.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use disclosure_store::{RequestStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("disclosure.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     // let id = store.insert_request(NewRequest::awaiting(from, to, sealed)).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Ascending ids**: ids are assigned by the store and never reused
//! - **At-most-once transitions**: a record leaves `AWAIT` exactly once;
//!   later attempts report [`TransitionResult::AlreadyFinal`]
//! - **Opaque payloads**: sealed request and response data are stored as given

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{FieldMap, ProfileRepository, RequestStore, TransitionResult};
