//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use disclosure::{Client, ClientConfig};
use disclosure_core::{Identity, KdfParams, Keypair, LocalIdentity, PublicKey};
use disclosure_perms::{PermsError, Site, SiteDataSource};
use disclosure_store::MemoryStore;

/// Site registry held in memory.
#[derive(Default)]
pub struct StaticSiteSource {
    sites: RwLock<HashMap<String, Site>>,
}

impl StaticSiteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a site.
    pub fn insert(&self, site: Site) {
        if let Ok(mut sites) = self.sites.write() {
            sites.insert(site.origin.clone(), site);
        }
    }

    pub fn with_site(self, site: Site) -> Self {
        self.insert(site);
        self
    }
}

#[async_trait]
impl SiteDataSource for StaticSiteSource {
    async fn get_site_data(&self, origin: &str) -> disclosure_perms::Result<Site> {
        self.sites
            .read()
            .ok()
            .and_then(|sites| sites.get(origin).cloned())
            .ok_or_else(|| PermsError::SiteNotFound(origin.to_string()))
    }
}

/// A site together with the identity behind its public key.
pub struct SiteFixture {
    pub identity: Arc<LocalIdentity>,
    pub site: Site,
}

impl SiteFixture {
    /// A site with a fresh identity.
    pub fn new(origin: &str) -> Self {
        let identity = Arc::new(LocalIdentity::generate());
        let site = Site::new(origin, identity.public_key());
        Self { identity, site }
    }

    /// A site trusted with every field.
    pub fn confidential(origin: &str) -> Self {
        let mut fixture = Self::new(origin);
        fixture.site = fixture.site.confidential();
        fixture
    }

    pub fn origin(&self) -> &str {
        &self.site.origin
    }

    pub fn public_key(&self) -> PublicKey {
        self.site.public_key
    }
}

/// A test fixture with an identity, a memory store and a site registry.
pub struct TestFixture {
    pub identity: Arc<LocalIdentity>,
    pub store: Arc<MemoryStore>,
    pub sites: Arc<StaticSiteSource>,
}

impl TestFixture {
    /// Create a new test fixture with a random identity.
    pub fn new() -> Self {
        Self::with_identity(LocalIdentity::generate())
    }

    /// Create with a deterministic identity from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::with_identity(LocalIdentity::new(Keypair::from_seed(&seed)))
    }

    /// Derive the identity from a passphrase with [`KdfParams::light`].
    pub fn from_passphrase(passphrase: &str) -> Self {
        let identity = LocalIdentity::derive(passphrase, &KdfParams::light())
            .expect("light kdf parameters are valid");
        Self::with_identity(identity)
    }

    fn with_identity(identity: LocalIdentity) -> Self {
        Self {
            identity: Arc::new(identity),
            store: Arc::new(MemoryStore::new()),
            sites: Arc::new(StaticSiteSource::new()),
        }
    }

    /// Another identity on the same store and site registry.
    pub fn peer(&self) -> Self {
        self.peer_with(LocalIdentity::generate())
    }

    fn peer_with(&self, identity: LocalIdentity) -> Self {
        Self {
            identity: Arc::new(identity),
            store: self.store.clone(),
            sites: self.sites.clone(),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.identity.public_key()
    }

    /// Register a new site and return it with its identity.
    pub fn register_site(&self, origin: &str) -> SiteFixture {
        let fixture = SiteFixture::new(origin);
        self.sites.insert(fixture.site.clone());
        fixture
    }

    /// Register a new confidential site.
    pub fn register_confidential_site(&self, origin: &str) -> SiteFixture {
        let fixture = SiteFixture::confidential(origin);
        self.sites.insert(fixture.site.clone());
        fixture
    }

    /// A client acting for this identity itself.
    pub fn client(&self) -> Client {
        self.client_with(ClientConfig::default().with_kdf(KdfParams::light()))
    }

    /// A client acting for `origin`.
    pub fn client_for(&self, origin: &str) -> Client {
        self.client_with(ClientConfig::for_origin(origin).with_kdf(KdfParams::light()))
    }

    pub fn client_with(&self, config: ClientConfig) -> Client {
        Client::local(
            self.identity.clone(),
            self.store.clone(),
            self.sites.clone(),
            config,
        )
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create fixtures for multi-party tests. All parties share one store and
/// one site registry; identities are deterministic per index.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    let Some(first) = (count > 0).then(|| TestFixture::with_seed(seed(0))) else {
        return Vec::new();
    };

    let mut parties: Vec<TestFixture> = (1..count)
        .map(|i| first.peer_with(LocalIdentity::new(Keypair::from_seed(&seed(i)))))
        .collect();
    parties.insert(0, first);
    parties
}

fn seed(index: usize) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&(index as u64).to_le_bytes());
    seed[31] = 0xd5;
    seed
}
