//! Transport abstraction.
//!
//! The core never builds wire frames. It hands a method name and JSON params
//! to a [`Transport`] and gets JSON back. Connectivity failures surface as
//! [`TransportError`] and are passed to callers unmodified.

use async_trait::async_trait;
use serde_json::Value;

use disclosure_core::TransportError;

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Request/response capability over some connection.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` with `params` and wait for the reply.
    async fn submit(&self, method: &str, params: Value) -> Result<Value>;

    /// Close the connection. Later submits fail with
    /// [`TransportError::Disconnected`].
    async fn disconnect(&self);
}

/// Serves RPC calls on the far side of a transport.
#[async_trait]
pub trait RpcHandler: Send + Sync {
    /// Handle one call.
    async fn handle(&self, method: &str, params: Value) -> crate::error::Result<Value>;
}

/// An in-process transport for tests and embedding.
///
/// Calls go straight to an [`RpcHandler`]; handler errors come back as
/// [`TransportError::Remote`] exactly as a networked transport would report them.
pub mod loopback {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Loopback transport implementation.
    pub struct LoopbackTransport {
        handler: Arc<dyn RpcHandler>,
        connected: AtomicBool,
        timeout: Option<Duration>,
    }

    impl LoopbackTransport {
        /// Create a connected transport routed to `handler`.
        pub fn new(handler: Arc<dyn RpcHandler>) -> Self {
            Self {
                handler,
                connected: AtomicBool::new(true),
                timeout: None,
            }
        }

        /// Fail calls that take longer than `timeout`.
        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = Some(timeout);
            self
        }

        /// Whether `disconnect` has been called.
        pub fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for LoopbackTransport {
        async fn submit(&self, method: &str, params: Value) -> Result<Value> {
            if !self.is_connected() {
                return Err(TransportError::Disconnected);
            }

            tracing::trace!(method, "loopback submit");
            let call = self.handler.handle(method, params);

            let reply = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .map_err(|_| TransportError::Timeout(format!("{method} after {limit:?}")))?,
                None => call.await,
            };

            reply.map_err(|e| {
                tracing::debug!(method, error = %e, "remote call failed");
                e.into_transport_error()
            })
        }

        async fn disconnect(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }
    }
}
