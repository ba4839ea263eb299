//! Data request records and their state machine.
//!
//! A request flows from the requester (`from`) to the data owner (`to`).
//! `request_data` is sealed for `to`; `response_data` is sealed for `from`.
//!
//! ```text
//! AWAIT ──respond──> ACCEPT   (terminal)
//!   └────reject────> REJECT   (terminal)
//! grant ───────────> ACCEPT   (created terminal)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crypto::PublicKey;
use crate::error::{CoreError, Result};
use crate::sealed::Ciphertext;
use crate::types::{OfferId, RequestId};

/// State of a data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum RequestState {
    /// Waiting for the owner to answer.
    Await = 0,
    /// Answered; `response_data` is set.
    Accept = 1,
    /// Declined; `response_data` stays empty.
    Reject = 2,
}

impl RequestState {
    /// Wire value.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Await),
            1 => Some(Self::Accept),
            2 => Some(Self::Reject),
            _ => None,
        }
    }

    /// Terminal states admit no further transition.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Await)
    }

    /// Whether `self -> next` is a legal transition.
    pub const fn can_transition_to(self, next: RequestState) -> bool {
        matches!(
            (self, next),
            (Self::Await, Self::Accept) | (Self::Await, Self::Reject)
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Await => "AWAIT",
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
        };
        f.write_str(name)
    }
}

impl From<RequestState> for u8 {
    fn from(state: RequestState) -> Self {
        state.as_u8()
    }
}

impl TryFrom<u8> for RequestState {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_u8(value).ok_or_else(|| format!("unknown request state {value}"))
    }
}

/// A stored data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub id: RequestId,
    pub from: PublicKey,
    pub to: PublicKey,
    pub request_data: Option<Ciphertext>,
    pub response_data: Option<Ciphertext>,
    pub state: RequestState,
    /// Set only for grants tied to an offer.
    pub offer_id: Option<OfferId>,
}

/// A request about to be stored; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRequest {
    pub from: PublicKey,
    pub to: PublicKey,
    pub request_data: Option<Ciphertext>,
    pub response_data: Option<Ciphertext>,
    pub state: RequestState,
    pub offer_id: Option<OfferId>,
}

impl NewRequest {
    /// An interactive request awaiting an answer.
    pub fn awaiting(from: PublicKey, to: PublicKey, request_data: Ciphertext) -> Self {
        Self {
            from,
            to,
            request_data: Some(request_data),
            response_data: None,
            state: RequestState::Await,
            offer_id: None,
        }
    }

    /// A proactive grant, created already accepted.
    pub fn granted(from: PublicKey, to: PublicKey, response_data: Ciphertext) -> Self {
        Self {
            from,
            to,
            request_data: None,
            response_data: Some(response_data),
            state: RequestState::Accept,
            offer_id: None,
        }
    }

    /// Tie this record to an offer.
    pub fn with_offer(mut self, offer_id: OfferId) -> Self {
        self.offer_id = Some(offer_id);
        self
    }

    /// Attach the store-assigned id.
    pub fn into_request(self, id: RequestId) -> DataRequest {
        DataRequest {
            id,
            from: self.from,
            to: self.to,
            request_data: self.request_data,
            response_data: self.response_data,
            state: self.state,
            offer_id: self.offer_id,
        }
    }
}

/// Query over stored requests. At least one endpoint is always set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFilter {
    from: Option<PublicKey>,
    to: Option<PublicKey>,
    state: RequestState,
}

impl RequestFilter {
    /// Build a filter; fails when both endpoints are absent.
    pub fn new(from: Option<PublicKey>, to: Option<PublicKey>, state: RequestState) -> Result<Self> {
        if from.is_none() && to.is_none() {
            return Err(CoreError::InvalidQuery(
                "at least one of from/to must be given".into(),
            ));
        }
        Ok(Self { from, to, state })
    }

    /// Requests sent by `from`.
    pub fn sent_by(from: PublicKey, state: RequestState) -> Self {
        Self {
            from: Some(from),
            to: None,
            state,
        }
    }

    /// Requests addressed to `to`.
    pub fn addressed_to(to: PublicKey, state: RequestState) -> Self {
        Self {
            from: None,
            to: Some(to),
            state,
        }
    }

    /// Requests between two specific endpoints.
    pub fn between(from: PublicKey, to: PublicKey, state: RequestState) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            state,
        }
    }

    pub fn from(&self) -> Option<&PublicKey> {
        self.from.as_ref()
    }

    pub fn to(&self) -> Option<&PublicKey> {
        self.to.as_ref()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Whether a record satisfies this filter.
    pub fn matches(&self, request: &DataRequest) -> bool {
        request.state == self.state
            && self.from.map_or(true, |pk| pk == request.from)
            && self.to.map_or(true, |pk| pk == request.to)
    }
}
