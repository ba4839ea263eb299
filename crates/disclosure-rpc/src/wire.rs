//! Wire records.
//!
//! ```json
//! {"id": 1, "fromPK": "<hex>", "toPK": "<hex>",
//!  "requestData": "<base64>" | null, "responseData": "<base64>" | null,
//!  "state": 0, "offerId": 7}
//! ```
//!
//! `offerId` is omitted when the record is not tied to an offer.

use serde::{Deserialize, Serialize};

use disclosure_core::{Ciphertext, DataRequest, NewRequest, OfferId, PublicKey, RequestId, RequestState};

/// A data request as it travels over the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequestWire {
    pub id: RequestId,
    #[serde(rename = "fromPK")]
    pub from_pk: PublicKey,
    #[serde(rename = "toPK")]
    pub to_pk: PublicKey,
    pub request_data: Option<Ciphertext>,
    pub response_data: Option<Ciphertext>,
    pub state: RequestState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<OfferId>,
}

impl From<DataRequest> for DataRequestWire {
    fn from(request: DataRequest) -> Self {
        Self {
            id: request.id,
            from_pk: request.from,
            to_pk: request.to,
            request_data: request.request_data,
            response_data: request.response_data,
            state: request.state,
            offer_id: request.offer_id,
        }
    }
}

impl From<DataRequestWire> for DataRequest {
    fn from(wire: DataRequestWire) -> Self {
        Self {
            id: wire.id,
            from: wire.from_pk,
            to: wire.to_pk,
            request_data: wire.request_data,
            response_data: wire.response_data,
            state: wire.state,
            offer_id: wire.offer_id,
        }
    }
}

/// A record to insert; the serving store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequestWire {
    #[serde(rename = "fromPK")]
    pub from_pk: PublicKey,
    #[serde(rename = "toPK")]
    pub to_pk: PublicKey,
    pub request_data: Option<Ciphertext>,
    pub response_data: Option<Ciphertext>,
    pub state: RequestState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<OfferId>,
}

impl From<NewRequest> for NewRequestWire {
    fn from(request: NewRequest) -> Self {
        Self {
            from_pk: request.from,
            to_pk: request.to,
            request_data: request.request_data,
            response_data: request.response_data,
            state: request.state,
            offer_id: request.offer_id,
        }
    }
}

impl From<NewRequestWire> for NewRequest {
    fn from(wire: NewRequestWire) -> Self {
        Self {
            from: wire.from_pk,
            to: wire.to_pk,
            request_data: wire.request_data,
            response_data: wire.response_data,
            state: wire.state,
            offer_id: wire.offer_id,
        }
    }
}
