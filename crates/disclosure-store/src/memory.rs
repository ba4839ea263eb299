//! In-memory implementation of the store traits.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use disclosure_core::{
    Ciphertext, DataRequest, NewRequest, PublicKey, RequestFilter, RequestId, RequestState,
};

use crate::error::Result;
use crate::traits::{check_target, FieldMap, ProfileRepository, RequestStore, TransitionResult};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. A single lock guards every
/// table, so each operation sees and leaves a consistent state.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Last id handed out.
    last_id: u64,

    /// Requests ordered by id.
    requests: BTreeMap<RequestId, DataRequest>,

    /// Profiles by owner.
    profiles: HashMap<PublicKey, FieldMap>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert_request(&self, request: NewRequest) -> Result<RequestId> {
        let mut inner = self.inner.write().await;

        inner.last_id += 1;
        let id = RequestId(inner.last_id);
        inner.requests.insert(id, request.into_request(id));

        Ok(id)
    }

    async fn get_request(&self, id: RequestId) -> Result<Option<DataRequest>> {
        let inner = self.inner.read().await;
        Ok(inner.requests.get(&id).cloned())
    }

    async fn transition(
        &self,
        id: RequestId,
        to_state: RequestState,
        response_data: Option<Ciphertext>,
    ) -> Result<TransitionResult> {
        check_target(to_state)?;
        let mut inner = self.inner.write().await;

        let Some(record) = inner.requests.get_mut(&id) else {
            return Ok(TransitionResult::NotFound);
        };

        if record.state.is_terminal() {
            return Ok(TransitionResult::AlreadyFinal(record.state));
        }

        record.state = to_state;
        record.response_data = response_data;
        Ok(TransitionResult::Applied)
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<DataRequest>> {
        let inner = self.inner.read().await;
        Ok(inner
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, owner: &PublicKey) -> Result<FieldMap> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(owner).cloned().unwrap_or_default())
    }

    async fn put_fields(&self, owner: &PublicKey, fields: &FieldMap) -> Result<()> {
        let mut inner = self.inner.write().await;
        let profile = inner.profiles.entry(*owner).or_default();
        for (name, ciphertext) in fields {
            profile.insert(name.clone(), ciphertext.clone());
        }
        Ok(())
    }
}
