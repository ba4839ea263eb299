//! Permission resolution with an explicit cache.
//!
//! Resolution for an (identity, origin) pair runs at most once until it is
//! invalidated. Concurrent first-time resolutions may both fetch; the first
//! to finish is cached and every reader sees a complete [`Permission`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use disclosure_core::{Identity, PublicKey, RequestState};

use crate::error::Result;
use crate::grant::granted_field_names;
use crate::permission::{AccessContext, Permission};
use crate::site::{PermissionsSource, SiteDataSource};

type CacheKey = (PublicKey, String);

/// Resolves and caches what each origin may read.
pub struct PermissionResolver {
    sites: Arc<dyn SiteDataSource>,
    grants: Arc<dyn PermissionsSource>,
    cache: RwLock<HashMap<CacheKey, Arc<Permission>>>,
}

impl PermissionResolver {
    /// Create a resolver over the given collaborators.
    pub fn new(sites: Arc<dyn SiteDataSource>, grants: Arc<dyn PermissionsSource>) -> Self {
        Self {
            sites,
            grants,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Permission for `identity` in `context`, from cache when possible.
    pub async fn resolve<I>(&self, identity: &I, context: &AccessContext) -> Result<Arc<Permission>>
    where
        I: Identity + ?Sized,
    {
        let origin = match context {
            AccessContext::Owner => return Ok(Arc::new(Permission::wildcard())),
            AccessContext::Origin(origin) => origin,
        };

        let key = (identity.public_key(), origin.clone());
        if let Some(cached) = self.cache.read().await.get(&key) {
            tracing::trace!(origin = %origin, "permission cache hit");
            return Ok(Arc::clone(cached));
        }

        let fetched = Arc::new(self.fetch(identity, origin).await?);

        let mut cache = self.cache.write().await;
        let entry = cache.entry(key).or_insert(fetched);
        Ok(Arc::clone(entry))
    }

    /// Resolve without touching the cache.
    pub async fn fetch<I>(&self, identity: &I, origin: &str) -> Result<Permission>
    where
        I: Identity + ?Sized,
    {
        let site = self.sites.get_site_data(origin).await?;

        if site.confidential {
            tracing::debug!(origin = %origin, "confidential site, wildcard permission");
            return Ok(Permission::wildcard());
        }

        let own = identity.public_key();
        let records = self.grants.grant_access_records(&site, &own).await?;

        let mut permission = Permission::empty();
        for record in records {
            if record.state != RequestState::Accept {
                continue;
            }
            let Some(response) = record.response_data.as_ref() else {
                continue;
            };

            let plaintext = match identity.decrypt_from(&site.public_key, response) {
                Ok(plaintext) => plaintext,
                Err(e) => {
                    tracing::warn!(origin = %origin, request = %record.id, error = %e, "skipping unreadable grant record");
                    continue;
                }
            };

            match granted_field_names(&plaintext) {
                Ok(fields) => permission = permission.union(&Permission::from_fields(fields)),
                Err(e) => {
                    tracing::warn!(origin = %origin, request = %record.id, error = %e, "skipping malformed grant record");
                }
            }
        }

        tracing::debug!(origin = %origin, fields = permission.len(), "resolved site permission");
        Ok(permission)
    }

    /// Cached permission, if resolution already completed.
    pub async fn cached(&self, identity: &PublicKey, origin: &str) -> Option<Arc<Permission>> {
        self.cache
            .read()
            .await
            .get(&(*identity, origin.to_string()))
            .cloned()
    }

    /// Drop the cached permission for one pair. Returns whether one was cached.
    pub async fn invalidate(&self, identity: &PublicKey, origin: &str) -> bool {
        self.cache
            .write()
            .await
            .remove(&(*identity, origin.to_string()))
            .is_some()
    }

    /// Drop every cached permission.
    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use disclosure_core::{DataRequest, LocalIdentity, RequestId};

    use crate::error::PermsError;
    use crate::grant::encode_field_names;
    use crate::site::Site;

    struct OneSite {
        site: Site,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl SiteDataSource for OneSite {
        async fn get_site_data(&self, origin: &str) -> Result<Site> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if origin == self.site.origin {
                Ok(self.site.clone())
            } else {
                Err(PermsError::SiteNotFound(origin.to_string()))
            }
        }
    }

    struct FixedGrants(Vec<DataRequest>);

    #[async_trait]
    impl PermissionsSource for FixedGrants {
        async fn grant_access_records(
            &self,
            site: &Site,
            own_public_key: &PublicKey,
        ) -> Result<Vec<DataRequest>> {
            Ok(self
                .0
                .iter()
                .filter(|r| r.from == site.public_key && r.to == *own_public_key)
                .cloned()
                .collect())
        }
    }

    fn grant_record(
        id: u64,
        owner: &LocalIdentity,
        site_pk: PublicKey,
        payload: &[u8],
    ) -> DataRequest {
        DataRequest {
            id: RequestId(id),
            from: site_pk,
            to: owner.public_key(),
            request_data: None,
            response_data: Some(owner.encrypt_to(&site_pk, payload).unwrap()),
            state: RequestState::Accept,
            offer_id: None,
        }
    }

    fn resolver(site: Site, records: Vec<DataRequest>) -> (PermissionResolver, Arc<OneSite>) {
        let sites = Arc::new(OneSite {
            site,
            lookups: AtomicUsize::new(0),
        });
        let resolver = PermissionResolver::new(sites.clone(), Arc::new(FixedGrants(records)));
        (resolver, sites)
    }

    const ORIGIN: &str = "https://shop.example";

    #[tokio::test]
    async fn test_owner_context_is_wildcard() {
        let owner = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();
        let (resolver, sites) = resolver(Site::new(ORIGIN, site_pk), vec![]);

        let perm = resolver.resolve(&owner, &AccessContext::Owner).await.unwrap();
        assert!(perm.is_wildcard());
        assert_eq!(sites.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confidential_site_is_wildcard() {
        let owner = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();
        let (resolver, _) = resolver(Site::new(ORIGIN, site_pk).confidential(), vec![]);

        let perm = resolver
            .resolve(&owner, &AccessContext::origin(ORIGIN))
            .await
            .unwrap();
        assert!(perm.is_wildcard());
    }

    #[tokio::test]
    async fn test_no_grants_is_empty_not_error() {
        let owner = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();
        let (resolver, _) = resolver(Site::new(ORIGIN, site_pk), vec![]);

        let perm = resolver
            .resolve(&owner, &AccessContext::origin(ORIGIN))
            .await
            .unwrap();
        assert!(perm.is_empty());
        assert!(!perm.allows("email"));
    }

    #[tokio::test]
    async fn test_grants_are_unioned() {
        let owner = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();
        let records = vec![
            grant_record(1, &owner, site_pk, &encode_field_names(&["name"]).unwrap()),
            grant_record(2, &owner, site_pk, br#"{"email": "00"}"#),
        ];
        let (resolver, _) = resolver(Site::new(ORIGIN, site_pk), records);

        let perm = resolver
            .resolve(&owner, &AccessContext::origin(ORIGIN))
            .await
            .unwrap();
        assert!(perm.allows("name"));
        assert!(perm.allows("email"));
        assert!(!perm.allows("phone"));
    }

    #[tokio::test]
    async fn test_unreadable_records_are_skipped() {
        let owner = LocalIdentity::generate();
        let stranger = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();

        let mut foreign = grant_record(1, &stranger, site_pk, br#"["phone"]"#);
        foreign.to = owner.public_key();
        let records = vec![
            foreign,
            grant_record(2, &owner, site_pk, b"not json"),
            grant_record(3, &owner, site_pk, br#"["name"]"#),
        ];
        let (resolver, _) = resolver(Site::new(ORIGIN, site_pk), records);

        let perm = resolver.fetch(&owner, ORIGIN).await.unwrap();
        assert!(perm.allows("name"));
        assert!(!perm.allows("phone"));
    }

    #[tokio::test]
    async fn test_resolution_is_cached_until_invalidated() {
        let owner = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();
        let (resolver, sites) = resolver(Site::new(ORIGIN, site_pk), vec![]);
        let context = AccessContext::origin(ORIGIN);

        resolver.resolve(&owner, &context).await.unwrap();
        resolver.resolve(&owner, &context).await.unwrap();
        assert_eq!(sites.lookups.load(Ordering::SeqCst), 1);
        assert!(resolver.cached(&owner.public_key(), ORIGIN).await.is_some());

        assert!(resolver.invalidate(&owner.public_key(), ORIGIN).await);
        assert!(!resolver.invalidate(&owner.public_key(), ORIGIN).await);

        resolver.resolve(&owner, &context).await.unwrap();
        assert_eq!(sites.lookups.load(Ordering::SeqCst), 2);

        resolver.invalidate_all().await;
        assert!(resolver.cached(&owner.public_key(), ORIGIN).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_resolutions_agree() {
        let owner = Arc::new(LocalIdentity::generate());
        let site_pk = LocalIdentity::generate().public_key();
        let records = vec![
            grant_record(1, &owner, site_pk, br#"["name"]"#),
            grant_record(2, &owner, site_pk, br#"{"email": "00"}"#),
            grant_record(3, &owner, site_pk, br#"["phone", "city"]"#),
        ];
        let (resolver, sites) = resolver(Site::new(ORIGIN, site_pk), records);
        let resolver = Arc::new(resolver);
        let expected = Permission::from_fields(["name", "email", "phone", "city"]);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let resolver = resolver.clone();
                let owner = owner.clone();
                tokio::spawn(async move {
                    resolver
                        .resolve(owner.as_ref(), &AccessContext::origin(ORIGIN))
                        .await
                })
            })
            .collect();

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap().unwrap());
        }

        for perm in &results {
            assert_eq!(**perm, expected);
        }

        let cached = resolver.cached(&owner.public_key(), ORIGIN).await.unwrap();
        assert_eq!(*cached, expected);
        assert!(sites.lookups.load(Ordering::SeqCst) <= 16);

        // settled: later readers get the cached value without a lookup
        let before = sites.lookups.load(Ordering::SeqCst);
        let again = resolver
            .resolve(owner.as_ref(), &AccessContext::origin(ORIGIN))
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&again, &cached));
        assert_eq!(sites.lookups.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn test_granted_field_named_any_is_not_wildcard() {
        let owner = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();
        let records = vec![grant_record(1, &owner, site_pk, br#"["Any"]"#)];
        let (resolver, _) = resolver(Site::new(ORIGIN, site_pk), records);

        let perm = resolver
            .resolve(&owner, &AccessContext::origin(ORIGIN))
            .await
            .unwrap();
        assert!(!perm.is_wildcard());
        assert!(perm.allows("any"));
        assert!(!perm.allows("ssn"));
    }

    #[tokio::test]
    async fn test_unknown_origin_is_error() {
        let owner = LocalIdentity::generate();
        let site_pk = LocalIdentity::generate().public_key();
        let (resolver, _) = resolver(Site::new(ORIGIN, site_pk), vec![]);

        let err = resolver
            .resolve(&owner, &AccessContext::origin("https://other.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, PermsError::SiteNotFound(_)));
    }
}
