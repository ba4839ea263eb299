//! The Client: one identity wired to its stores, sites and permissions.

use std::sync::Arc;

use disclosure_core::{Identity, LocalIdentity, PublicKey};
use disclosure_perms::{AccessContext, FieldKeyDerivation, PermissionResolver, SiteDataSource};
use disclosure_rpc::{RpcProfileRepository, RpcRequestStore, RpcSiteDataSource, Transport};
use disclosure_store::{ProfileRepository, RequestStore};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::grants::StoreGrantSource;
use crate::profile::ProfileStore;
use crate::requests::DataRequestWorkflow;

/// Entry point for profile and request operations.
///
/// Provides:
/// - the encrypted profile through [`profile`](Self::profile)
/// - requests and grants through [`requests`](Self::requests)
/// - permission cache control
///
/// The permission cache is shared by every client made with
/// [`with_context`](Self::with_context) from this one.
#[derive(Clone)]
pub struct Client {
    identity: Arc<dyn Identity>,
    config: ClientConfig,
    resolver: Arc<PermissionResolver>,
    profile_repository: Arc<dyn ProfileRepository>,
    profile: ProfileStore,
    requests: DataRequestWorkflow,
    transport: Option<Arc<dyn Transport>>,
}

impl Client {
    /// Create a client from its collaborators.
    pub fn new(
        identity: Arc<dyn Identity>,
        requests: Arc<dyn RequestStore>,
        profiles: Arc<dyn ProfileRepository>,
        sites: Arc<dyn SiteDataSource>,
        config: ClientConfig,
    ) -> Self {
        let grants = Arc::new(StoreGrantSource::new(requests.clone()));
        let resolver = Arc::new(PermissionResolver::new(sites, grants));
        Self::assemble(identity, config, resolver, requests, profiles, None)
    }

    /// Derive the identity from `passphrase` with the configured parameters.
    pub fn from_passphrase(
        passphrase: &str,
        requests: Arc<dyn RequestStore>,
        profiles: Arc<dyn ProfileRepository>,
        sites: Arc<dyn SiteDataSource>,
        config: ClientConfig,
    ) -> Result<Self> {
        let identity = Arc::new(LocalIdentity::derive(passphrase, &config.kdf)?);
        Ok(Self::new(identity, requests, profiles, sites, config))
    }

    /// Use one backend for both requests and profiles.
    pub fn local<S>(
        identity: Arc<dyn Identity>,
        store: Arc<S>,
        sites: Arc<dyn SiteDataSource>,
        config: ClientConfig,
    ) -> Self
    where
        S: RequestStore + ProfileRepository + 'static,
    {
        Self::new(identity, store.clone(), store, sites, config)
    }

    /// Reach every collaborator through `transport`.
    pub fn over_transport(
        identity: Arc<dyn Identity>,
        transport: Arc<dyn Transport>,
        config: ClientConfig,
    ) -> Self {
        let requests: Arc<dyn RequestStore> = Arc::new(RpcRequestStore::new(transport.clone()));
        let grants = Arc::new(StoreGrantSource::new(requests.clone()));
        let sites = Arc::new(RpcSiteDataSource::new(transport.clone()));
        let resolver = Arc::new(PermissionResolver::new(sites, grants));
        let profiles = Arc::new(RpcProfileRepository::new(transport.clone()));

        Self::assemble(identity, config, resolver, requests, profiles, Some(transport))
    }

    fn assemble(
        identity: Arc<dyn Identity>,
        config: ClientConfig,
        resolver: Arc<PermissionResolver>,
        requests: Arc<dyn RequestStore>,
        profile_repository: Arc<dyn ProfileRepository>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Self {
        let keys = FieldKeyDerivation::new(resolver.clone(), config.access_context());
        let profile = ProfileStore::new(identity.clone(), profile_repository.clone(), keys);
        let requests = DataRequestWorkflow::new(identity.clone(), requests);

        Self {
            identity,
            config,
            resolver,
            profile_repository,
            profile,
            requests,
            transport,
        }
    }

    /// The same identity and backends acting for `origin`, or for itself
    /// when `origin` is `None`.
    pub fn with_context(&self, origin: Option<String>) -> Self {
        let config = ClientConfig {
            origin,
            ..self.config.clone()
        };
        let keys = FieldKeyDerivation::new(self.resolver.clone(), config.access_context());

        Self {
            profile: ProfileStore::new(
                self.identity.clone(),
                self.profile_repository.clone(),
                keys,
            ),
            config,
            ..self.clone()
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn identity(&self) -> &Arc<dyn Identity> {
        &self.identity
    }

    pub fn public_key(&self) -> PublicKey {
        self.identity.public_key()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn access_context(&self) -> AccessContext {
        self.config.access_context()
    }

    /// The encrypted profile of this identity.
    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    /// Requests, responses and grants.
    pub fn requests(&self) -> &DataRequestWorkflow {
        &self.requests
    }

    pub fn resolver(&self) -> &Arc<PermissionResolver> {
        &self.resolver
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Drop the cached permission of this identity for `origin`.
    ///
    /// Call after a grant to the origin so the next read sees it.
    pub async fn invalidate_permissions(&self, origin: &str) -> bool {
        self.resolver
            .invalidate(&self.identity.public_key(), origin)
            .await
    }

    /// Close the transport, if the client has one. Later remote calls fail
    /// with [`TransportError::Disconnected`](disclosure_core::TransportError::Disconnected).
    pub async fn disconnect(&self) {
        if let Some(transport) = &self.transport {
            transport.disconnect().await;
            tracing::debug!(address = %self.identity.address(), "client disconnected");
        }
    }
}
