//! The data request workflow.
//!
//! Requests, responses and grants between two identities. Payloads are
//! sealed with [`Identity::encrypt_to`] so only the two endpoints of a
//! record can read them.
//!
//! ```text
//! create_request ──> AWAIT ──response_to_request──> ACCEPT
//!                      └─────reject_request──────> REJECT
//! grant_access_for_client / grant_access_for_offer ──> ACCEPT
//! ```
//!
//! Terminal records are never rewritten. A transition on one fails with
//! [`ClientError::InvalidState`], including a retry of a call that
//! already succeeded.

use std::sync::Arc;

use disclosure_core::{
    Ciphertext, DataRequest, Identity, NewRequest, OfferId, PublicKey, RequestFilter, RequestId,
    RequestState,
};
use disclosure_perms::{derive_field_key, encode_field_names, GrantedKeys};
use disclosure_store::{RequestStore, TransitionResult};

use crate::error::{ClientError, Result};

/// Request, response and grant operations for one identity.
#[derive(Clone)]
pub struct DataRequestWorkflow {
    identity: Arc<dyn Identity>,
    store: Arc<dyn RequestStore>,
}

impl DataRequestWorkflow {
    pub fn new(identity: Arc<dyn Identity>, store: Arc<dyn RequestStore>) -> Self {
        Self { identity, store }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Interactive requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask `to` for `field_names`. Returns the new request id.
    pub async fn create_request<S: AsRef<str>>(
        &self,
        to: &PublicKey,
        field_names: &[S],
    ) -> Result<RequestId> {
        let plaintext = encode_field_names(field_names)?;
        let sealed = self.identity.encrypt_to(to, &plaintext)?;

        let id = self
            .store
            .insert_request(NewRequest::awaiting(self.identity.public_key(), *to, sealed))
            .await?;

        tracing::debug!(request = %id, to = %to.address(), fields = field_names.len(), "created data request");
        Ok(id)
    }

    /// Answer request `id` with `payload`, sealed for `requester`.
    pub async fn response_to_request(
        &self,
        id: RequestId,
        requester: &PublicKey,
        payload: &[u8],
    ) -> Result<()> {
        let record = self.ensure_answerable(id).await?;
        if record.from != *requester {
            return Err(ClientError::RequesterMismatch {
                id,
                requester: record.from.address(),
                given: requester.address(),
            });
        }

        let sealed = self.identity.encrypt_to(&record.from, payload)?;
        self.apply(id, RequestState::Accept, Some(sealed)).await
    }

    /// Answer request `id` with the field keys for `field_names`.
    ///
    /// The requester decrypts them with
    /// [`get_granted_keys`](Self::get_granted_keys).
    pub async fn accept_request<S: AsRef<str>>(
        &self,
        id: RequestId,
        requester: &PublicKey,
        field_names: &[S],
    ) -> Result<()> {
        let payload = self.granted_keys(field_names).to_json()?;
        self.response_to_request(id, requester, &payload).await
    }

    /// Decline request `id`. No response data is written.
    pub async fn reject_request(&self, id: RequestId) -> Result<()> {
        self.ensure_answerable(id).await?;
        self.apply(id, RequestState::Reject, None).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Proactive grants
    // ─────────────────────────────────────────────────────────────────────────

    /// Disclose `field_names` to `client` without a prior request.
    ///
    /// The record is stored already accepted, from the client to this
    /// identity, which is where permission resolution looks for it.
    pub async fn grant_access_for_client<S: AsRef<str>>(
        &self,
        client: &PublicKey,
        field_names: &[S],
    ) -> Result<RequestId> {
        let sealed = self.seal_grant(client, field_names)?;
        let id = self
            .store
            .insert_request(NewRequest::granted(*client, self.identity.public_key(), sealed))
            .await?;

        tracing::debug!(request = %id, client = %client.address(), fields = field_names.len(), "granted access");
        Ok(id)
    }

    /// Disclose `field_names` to the owner of offer `offer_id`.
    pub async fn grant_access_for_offer<S: AsRef<str>>(
        &self,
        offer_id: OfferId,
        offer_owner: &PublicKey,
        field_names: &[S],
    ) -> Result<RequestId> {
        let sealed = self.seal_grant(offer_owner, field_names)?;
        let grant = NewRequest::granted(*offer_owner, self.identity.public_key(), sealed)
            .with_offer(offer_id);
        let id = self.store.insert_request(grant).await?;

        tracing::debug!(request = %id, offer = %offer_id, fields = field_names.len(), "granted access for offer");
        Ok(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries and decryption
    // ─────────────────────────────────────────────────────────────────────────

    /// Records matching the given endpoints and state, by ascending id.
    ///
    /// At least one endpoint must be given.
    pub async fn get_requests(
        &self,
        from: Option<&PublicKey>,
        to: Option<&PublicKey>,
        state: RequestState,
    ) -> Result<Vec<DataRequest>> {
        let filter = RequestFilter::new(from.copied(), to.copied(), state)?;
        Ok(self.store.list_requests(&filter).await?)
    }

    /// Open a ciphertext exchanged with `counterparty`.
    pub fn decrypt_message(&self, counterparty: &PublicKey, ciphertext: &Ciphertext) -> Result<Vec<u8>> {
        Ok(self.identity.decrypt_from(counterparty, ciphertext)?)
    }

    /// Field keys carried by a record's response. Empty if there is none.
    pub fn get_granted_keys(&self, record: &DataRequest) -> Result<GrantedKeys> {
        let Some(response) = record.response_data.as_ref() else {
            return Ok(GrantedKeys::new());
        };
        let plaintext = self.decrypt_message(&self.counterparty(record), response)?;
        Ok(GrantedKeys::from_json(&plaintext)?)
    }

    /// Field names asked for by a record's request. Empty if there is none.
    pub fn get_requested_fields(&self, record: &DataRequest) -> Result<Vec<String>> {
        let Some(request) = record.request_data.as_ref() else {
            return Ok(Vec::new());
        };
        let plaintext = self.decrypt_message(&self.counterparty(record), request)?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn counterparty(&self, record: &DataRequest) -> PublicKey {
        if record.from == self.identity.public_key() {
            record.to
        } else {
            record.from
        }
    }

    fn granted_keys<S: AsRef<str>>(&self, field_names: &[S]) -> GrantedKeys {
        let digest = self.identity.secret_digest();
        let mut keys = GrantedKeys::new();
        for name in field_names {
            keys.insert(name.as_ref(), &derive_field_key(&digest, name.as_ref()));
        }
        keys
    }

    fn seal_grant<S: AsRef<str>>(&self, recipient: &PublicKey, field_names: &[S]) -> Result<Ciphertext> {
        let payload = self.granted_keys(field_names).to_json()?;
        Ok(self.identity.encrypt_to(recipient, &payload)?)
    }

    /// The record `id`, if this identity may still answer it.
    async fn ensure_answerable(&self, id: RequestId) -> Result<DataRequest> {
        let record = self
            .store
            .get_request(id)
            .await?
            .ok_or(ClientError::NotFound(id))?;

        if record.to != self.identity.public_key() {
            tracing::debug!(request = %id, "refusing to answer a request addressed elsewhere");
            return Err(ClientError::NotAddressee(id));
        }
        if record.state.is_terminal() {
            return Err(ClientError::InvalidState {
                id,
                state: record.state,
            });
        }
        Ok(record)
    }

    async fn apply(
        &self,
        id: RequestId,
        state: RequestState,
        response: Option<Ciphertext>,
    ) -> Result<()> {
        match self.store.transition(id, state, response).await? {
            TransitionResult::Applied => {
                tracing::debug!(request = %id, %state, "request transitioned");
                Ok(())
            }
            TransitionResult::NotFound => Err(ClientError::NotFound(id)),
            TransitionResult::AlreadyFinal(current) => {
                tracing::debug!(request = %id, %current, "lost transition race");
                Err(ClientError::InvalidState { id, state: current })
            }
        }
    }
}
