//! Store traits: the abstract interface for request and profile persistence.
//!
//! These traits keep the workflow storage-agnostic. Implementations include
//! SQLite (primary), in-memory (for tests) and RPC-backed adapters.

use std::collections::BTreeMap;

use async_trait::async_trait;
use disclosure_core::{Ciphertext, DataRequest, NewRequest, PublicKey, RequestFilter, RequestId, RequestState};

use crate::error::Result;

/// Encrypted profile fields of one owner: field name to field ciphertext.
pub type FieldMap = BTreeMap<String, String>;

/// Result of a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// The record left `AWAIT` and now holds the requested state.
    Applied,
    /// No record with this id.
    NotFound,
    /// The record was already terminal; nothing was written.
    AlreadyFinal(RequestState),
}

/// Async interface for data request persistence.
///
/// # Design Notes
///
/// - **Ascending ids**: every inserted record gets an id greater than any
///   id handed out before.
/// - **Single transition**: a record leaves `AWAIT` at most once. The store
///   serializes the check and the write, so of two racing transitions exactly
///   one is `Applied`.
/// - **Snapshots**: `list_requests` reads a consistent point in time.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Store a new record and return its assigned id.
    async fn insert_request(&self, request: NewRequest) -> Result<RequestId>;

    /// Fetch a record by id.
    async fn get_request(&self, id: RequestId) -> Result<Option<DataRequest>>;

    /// Move an `AWAIT` record to `to_state`, setting `response_data`.
    ///
    /// Fails with [`StoreError::InvalidTransition`](crate::StoreError::InvalidTransition)
    /// when `to_state` is `AWAIT`.
    async fn transition(
        &self,
        id: RequestId,
        to_state: RequestState,
        response_data: Option<Ciphertext>,
    ) -> Result<TransitionResult>;

    /// Records matching `filter`, ordered by ascending id.
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<DataRequest>>;
}

/// Async interface for encrypted profile persistence.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Every stored field of `owner`. Unknown owners have an empty profile.
    async fn get_profile(&self, owner: &PublicKey) -> Result<FieldMap>;

    /// Insert or replace the given fields; other fields are left alone.
    async fn put_fields(&self, owner: &PublicKey, fields: &FieldMap) -> Result<()>;
}

/// Reject transitions back into `AWAIT` before touching storage.
pub(crate) fn check_target(to_state: RequestState) -> Result<()> {
    if RequestState::Await.can_transition_to(to_state) {
        Ok(())
    } else {
        Err(crate::error::StoreError::InvalidTransition(to_state))
    }
}
