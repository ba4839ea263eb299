//! # Disclosure RPC
//!
//! Transport capability and the RPC plumbing around it.
//!
//! ## Overview
//!
//! The workflow and the permission resolver talk to remote state through
//! collaborator traits. This crate provides implementations of those traits
//! over a [`Transport`] and a handler that serves them from any store:
//!
//! - [`RpcRequestStore`], [`RpcProfileRepository`], [`RpcSiteDataSource`]
//!   encode calls as `submit(method, params)`
//! - [`StoreHandler`] answers those calls from a store and a site source
//! - [`LoopbackTransport`] connects the two in process
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use disclosure_rpc::{LoopbackTransport, RpcRequestStore, StoreHandler};
//! use disclosure_store::MemoryStore;
//!
//! // let handler = StoreHandler::new(Arc::new(MemoryStore::new()), sites);
//! // let transport = Arc::new(LoopbackTransport::new(Arc::new(handler)));
//! // let requests = RpcRequestStore::new(transport);
//! ```
//!
//! ## Message Flow
//!
//! ```text
//! Client                                Server
//!   |-- request.insert {fromPK,..} ----->|
//!   |<------------------------- id ------|
//!   |-- request.transition {id,state} -->|
//!   |<-------- {result: "applied"} ------|
//! ```

pub mod client;
pub mod error;
pub mod handler;
pub mod messages;
pub mod transport;
pub mod wire;

pub use client::{RpcProfileRepository, RpcRequestStore, RpcSiteDataSource};
pub use error::{Result, RpcError};
pub use handler::StoreHandler;
pub use messages::{methods, RpcErrorCode, TransitionReply};
pub use transport::{loopback::LoopbackTransport, RpcHandler, Transport};
pub use wire::{DataRequestWire, NewRequestWire};
