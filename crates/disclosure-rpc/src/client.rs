//! Calling side: store and site collaborators backed by a [`Transport`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use disclosure_core::{
    Ciphertext, DataRequest, NewRequest, PublicKey, RequestFilter, RequestId, RequestState,
    TransportError,
};
use disclosure_perms::{PermsError, Site, SiteDataSource};
use disclosure_store::{FieldMap, ProfileRepository, RequestStore, StoreError, TransitionResult};

use crate::messages::{
    methods, GetRequestParams, ListRequestsParams, ProfileParams, PutFieldsParams, RpcErrorCode,
    SiteParams, TransitionParams, TransitionReply,
};
use crate::transport::Transport;
use crate::wire::{DataRequestWire, NewRequestWire};

async fn call<P, R>(transport: &dyn Transport, method: &str, params: &P) -> Result<R, TransportError>
where
    P: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let params =
        serde_json::to_value(params).map_err(|e| TransportError::Protocol(e.to_string()))?;
    let reply = transport.submit(method, params).await?;
    serde_json::from_value(reply)
        .map_err(|e| TransportError::Protocol(format!("bad reply to {method}: {e}")))
}

/// [`RequestStore`] served by a remote [`StoreHandler`](crate::handler::StoreHandler).
#[derive(Clone)]
pub struct RpcRequestStore {
    transport: Arc<dyn Transport>,
}

impl RpcRequestStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl RequestStore for RpcRequestStore {
    async fn insert_request(&self, request: NewRequest) -> disclosure_store::Result<RequestId> {
        let wire = NewRequestWire::from(request);
        Ok(call(self.transport.as_ref(), methods::REQUEST_INSERT, &wire).await?)
    }

    async fn get_request(&self, id: RequestId) -> disclosure_store::Result<Option<DataRequest>> {
        let record: Option<DataRequestWire> =
            call(self.transport.as_ref(), methods::REQUEST_GET, &GetRequestParams { id }).await?;
        Ok(record.map(DataRequest::from))
    }

    async fn transition(
        &self,
        id: RequestId,
        to_state: RequestState,
        response_data: Option<Ciphertext>,
    ) -> disclosure_store::Result<TransitionResult> {
        let params = TransitionParams {
            id,
            state: to_state,
            response_data,
        };
        match call::<_, TransitionReply>(self.transport.as_ref(), methods::REQUEST_TRANSITION, &params)
            .await
        {
            Ok(reply) => Ok(reply.into()),
            Err(TransportError::Remote { code, .. })
                if code == RpcErrorCode::InvalidTransition.as_i64() =>
            {
                Err(StoreError::InvalidTransition(to_state))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> disclosure_store::Result<Vec<DataRequest>> {
        let params = ListRequestsParams {
            from: filter.from().copied(),
            to: filter.to().copied(),
            state: filter.state(),
        };
        let records: Vec<DataRequestWire> =
            call(self.transport.as_ref(), methods::REQUEST_LIST, &params).await?;
        Ok(records.into_iter().map(DataRequest::from).collect())
    }
}

/// [`ProfileRepository`] served by a remote handler.
#[derive(Clone)]
pub struct RpcProfileRepository {
    transport: Arc<dyn Transport>,
}

impl RpcProfileRepository {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ProfileRepository for RpcProfileRepository {
    async fn get_profile(&self, owner: &PublicKey) -> disclosure_store::Result<FieldMap> {
        let params = ProfileParams { owner: *owner };
        Ok(call(self.transport.as_ref(), methods::PROFILE_GET, &params).await?)
    }

    async fn put_fields(&self, owner: &PublicKey, fields: &FieldMap) -> disclosure_store::Result<()> {
        let params = PutFieldsParams {
            owner: *owner,
            fields: fields.clone(),
        };
        let _: serde_json::Value = call(self.transport.as_ref(), methods::PROFILE_PUT, &params).await?;
        Ok(())
    }
}

/// [`SiteDataSource`] served by a remote handler.
#[derive(Clone)]
pub struct RpcSiteDataSource {
    transport: Arc<dyn Transport>,
}

impl RpcSiteDataSource {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl SiteDataSource for RpcSiteDataSource {
    async fn get_site_data(&self, origin: &str) -> disclosure_perms::Result<Site> {
        let params = SiteParams {
            origin: origin.to_string(),
        };
        match call(self.transport.as_ref(), methods::SITE_GET, &params).await {
            Ok(site) => Ok(site),
            Err(TransportError::Remote { code, .. }) if code == RpcErrorCode::SiteNotFound.as_i64() => {
                Err(PermsError::SiteNotFound(origin.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
