//! Grant records as a permissions source.

use std::sync::Arc;

use async_trait::async_trait;

use disclosure_core::{DataRequest, PublicKey, RequestFilter, RequestState};
use disclosure_perms::{PermissionsSource, PermsError, Site};
use disclosure_store::{RequestStore, StoreError};

/// Reads accepted grant records from a [`RequestStore`].
///
/// A grant to a site is stored with `from` = the site's key and `to` = the
/// granting identity, so that is the pair this source lists.
#[derive(Clone)]
pub struct StoreGrantSource {
    store: Arc<dyn RequestStore>,
}

impl StoreGrantSource {
    pub fn new(store: Arc<dyn RequestStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionsSource for StoreGrantSource {
    async fn grant_access_records(
        &self,
        site: &Site,
        own_public_key: &PublicKey,
    ) -> disclosure_perms::Result<Vec<DataRequest>> {
        let filter = RequestFilter::between(site.public_key, *own_public_key, RequestState::Accept);
        self.store.list_requests(&filter).await.map_err(|e| match e {
            StoreError::Transport(t) => PermsError::Transport(t),
            other => PermsError::Source(other.to_string()),
        })
    }
}
