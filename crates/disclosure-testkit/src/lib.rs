//! # Disclosure Testkit
//!
//! Testing utilities for the disclosure crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: identities on a shared memory store with a site registry
//! - **Generators**: Proptest strategies for property-based testing
//! - **Tracing**: a subscriber for test output, filtered by `RUST_LOG`
//!
//! ## Test Fixtures
//!
//! ```rust
//! use disclosure_testkit::fixtures::TestFixture;
//!
//! let owner = TestFixture::new();
//! let shop = owner.register_site("https://shop.example");
//! let client = owner.client_for(shop.origin());
//! assert_eq!(client.public_key(), owner.public_key());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use disclosure_testkit::generators::profile;
//!
//! proptest! {
//!     #[test]
//!     fn fields_roundtrip(values in profile(6)) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{multi_party_fixtures, SiteFixture, StaticSiteSource, TestFixture};

/// Install a `tracing` subscriber for tests.
///
/// Honors `RUST_LOG` and defaults to `warn`. Safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
