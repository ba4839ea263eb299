//! RPC method names, parameters and replies.
//!
//! Every call is `submit(method, params)` with JSON params and a JSON reply.
//! Records travel as [`DataRequestWire`](crate::wire::DataRequestWire).

use serde::{Deserialize, Serialize};

use disclosure_core::{Ciphertext, PublicKey, RequestId, RequestState};
use disclosure_store::{FieldMap, TransitionResult};

/// Method names served by [`StoreHandler`](crate::handler::StoreHandler).
pub mod methods {
    /// Store a new record; replies with its id.
    pub const REQUEST_INSERT: &str = "request.insert";
    /// Fetch a record by id; replies with the record or null.
    pub const REQUEST_GET: &str = "request.get";
    /// Move an `AWAIT` record to a terminal state.
    pub const REQUEST_TRANSITION: &str = "request.transition";
    /// List records by endpoint and state.
    pub const REQUEST_LIST: &str = "request.list";
    /// Fetch an owner's encrypted fields.
    pub const PROFILE_GET: &str = "profile.get";
    /// Upsert an owner's encrypted fields.
    pub const PROFILE_PUT: &str = "profile.put";
    /// Fetch site data for an origin.
    pub const SITE_GET: &str = "site.get";
}

/// Error codes carried in [`TransportError::Remote`](disclosure_core::TransportError::Remote).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum RpcErrorCode {
    /// Internal error on the serving side.
    Internal = -32603,
    /// No such method.
    MethodNotFound = -32601,
    /// Malformed params.
    InvalidParams = -32602,
    /// Unknown origin.
    SiteNotFound = 1,
    /// Transition target is not terminal.
    InvalidTransition = 2,
}

impl RpcErrorCode {
    pub const fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(code: i64) -> Option<Self> {
        match code {
            -32603 => Some(Self::Internal),
            -32601 => Some(Self::MethodNotFound),
            -32602 => Some(Self::InvalidParams),
            1 => Some(Self::SiteNotFound),
            2 => Some(Self::InvalidTransition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequestParams {
    pub id: RequestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionParams {
    pub id: RequestId,
    pub state: RequestState,
    pub response_data: Option<Ciphertext>,
}

/// Wire form of [`TransitionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum TransitionReply {
    Applied,
    NotFound,
    AlreadyFinal { state: RequestState },
}

impl From<TransitionResult> for TransitionReply {
    fn from(result: TransitionResult) -> Self {
        match result {
            TransitionResult::Applied => Self::Applied,
            TransitionResult::NotFound => Self::NotFound,
            TransitionResult::AlreadyFinal(state) => Self::AlreadyFinal { state },
        }
    }
}

impl From<TransitionReply> for TransitionResult {
    fn from(reply: TransitionReply) -> Self {
        match reply {
            TransitionReply::Applied => Self::Applied,
            TransitionReply::NotFound => Self::NotFound,
            TransitionReply::AlreadyFinal { state } => Self::AlreadyFinal(state),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRequestsParams {
    #[serde(rename = "fromPK")]
    pub from: Option<PublicKey>,
    #[serde(rename = "toPK")]
    pub to: Option<PublicKey>,
    pub state: RequestState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileParams {
    pub owner: PublicKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutFieldsParams {
    pub owner: PublicKey,
    pub fields: FieldMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteParams {
    pub origin: String,
}
