//! Serving side: answers RPC calls from a store and a site source.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use disclosure_core::{NewRequest, RequestFilter};
use disclosure_perms::SiteDataSource;
use disclosure_store::{ProfileRepository, RequestStore};

use crate::error::{Result, RpcError};
use crate::messages::{
    methods, GetRequestParams, ListRequestsParams, ProfileParams, PutFieldsParams, SiteParams,
    TransitionParams, TransitionReply,
};
use crate::transport::RpcHandler;
use crate::wire::{DataRequestWire, NewRequestWire};

/// Serves `request.*` and `profile.*` from a store and `site.get` from a site source.
pub struct StoreHandler<S> {
    store: Arc<S>,
    sites: Arc<dyn SiteDataSource>,
}

impl<S> StoreHandler<S>
where
    S: RequestStore + ProfileRepository + 'static,
{
    pub fn new(store: Arc<S>, sites: Arc<dyn SiteDataSource>) -> Self {
        Self { store, sites }
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value> {
        match method {
            methods::REQUEST_INSERT => {
                let request: NewRequestWire = decode(params)?;
                let id = self.store.insert_request(NewRequest::from(request)).await?;
                encode(&id)
            }
            methods::REQUEST_GET => {
                let GetRequestParams { id } = decode(params)?;
                let record = self.store.get_request(id).await?;
                encode(&record.map(DataRequestWire::from))
            }
            methods::REQUEST_TRANSITION => {
                let TransitionParams {
                    id,
                    state,
                    response_data,
                } = decode(params)?;
                let result = self.store.transition(id, state, response_data).await?;
                encode(&TransitionReply::from(result))
            }
            methods::REQUEST_LIST => {
                let ListRequestsParams { from, to, state } = decode(params)?;
                let filter = RequestFilter::new(from, to, state)
                    .map_err(|e| RpcError::InvalidParams(e.to_string()))?;
                let records = self.store.list_requests(&filter).await?;
                encode(
                    &records
                        .into_iter()
                        .map(DataRequestWire::from)
                        .collect::<Vec<_>>(),
                )
            }
            methods::PROFILE_GET => {
                let ProfileParams { owner } = decode(params)?;
                encode(&self.store.get_profile(&owner).await?)
            }
            methods::PROFILE_PUT => {
                let PutFieldsParams { owner, fields } = decode(params)?;
                self.store.put_fields(&owner, &fields).await?;
                Ok(Value::Null)
            }
            methods::SITE_GET => {
                let SiteParams { origin } = decode(params)?;
                encode(&self.sites.get_site_data(&origin).await?)
            }
            other => Err(RpcError::UnknownMethod(other.to_string())),
        }
    }
}

#[async_trait]
impl<S> RpcHandler for StoreHandler<S>
where
    S: RequestStore + ProfileRepository + 'static,
{
    async fn handle(&self, method: &str, params: Value) -> Result<Value> {
        self.dispatch(method, params).await
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

fn encode<T: Serialize>(reply: &T) -> Result<Value> {
    serde_json::to_value(reply).map_err(|e| RpcError::Wire(e.to_string()))
}
