//! Event dispatch: pick the adapter that recognizes an incoming event, run
//! the downstream handler, and translate the outcome back to the platform.
//!
//! The dispatcher owns the ordered adapter set and the handler seam. It
//! supplies the delegated [`ResponseResolver`] on the error path, so every
//! accepted event yields exactly one platform response.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::adapters::{Adapter, AdapterError, ForwardErrorProps, ResponseProps, ResponseResolver};
use crate::types::{HttpRequest, HttpResponse};

/// Downstream application seam: consumes canonical requests, produces
/// canonical responses. Implementations run unmodified regardless of which
/// platform delivered the event.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle one canonical request.
    async fn handle(&self, request: HttpRequest) -> anyhow::Result<HttpResponse>;
}

/// Dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered adapter recognized the event.
    #[error("no adapter recognized the event")]
    NoAdapter,
    /// An adapter refused translation: a contract misuse, since the event
    /// already passed that adapter's `can_handle`.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    /// The error-forwarding path dropped the resolver without completing the
    /// exchange, which the contract forbids.
    #[error("response exchange was never completed")]
    Unresolved,
}

/// Owns the ordered adapter set and the downstream handler.
///
/// Immutable once built; share it behind an `Arc` across concurrent
/// invocations. Adapters are probed in registration order and the first
/// match wins, so registration order is also precedence order.
pub struct Dispatcher {
    adapters: Vec<Arc<dyn Adapter>>,
    handler: Arc<dyn RequestHandler>,
    respond_with_errors: bool,
}

impl Dispatcher {
    /// Create a dispatcher around a downstream handler, with no adapters
    /// registered and verbose error responses off.
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self {
            adapters: Vec::new(),
            handler,
            respond_with_errors: false,
        }
    }

    /// Register an adapter. Probe order is registration order.
    #[must_use]
    pub fn register(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    /// Include handler error detail in 500 response bodies. Off by default
    /// so diagnostics never leak to untrusted clients.
    #[must_use]
    pub fn respond_with_errors(mut self, enabled: bool) -> Self {
        self.respond_with_errors = enabled;
        self
    }

    /// Find the first registered adapter that recognizes the event.
    pub fn select_adapter(&self, event: &Value) -> Option<&dyn Adapter> {
        self.adapters
            .iter()
            .find(|adapter| adapter.can_handle(event))
            .map(|adapter| adapter.as_ref())
    }

    /// Translate an event, run the handler, and translate the outcome back.
    ///
    /// On handler failure the matched adapter builds the 500 fallback and
    /// completes the exchange through its delegated resolver.
    pub async fn dispatch(&self, event: &Value) -> Result<Value, DispatchError> {
        let adapter = self.select_adapter(event).ok_or(DispatchError::NoAdapter)?;
        let request_id = Uuid::new_v4();
        let request = adapter.get_request(event)?;
        debug!(
            request_id = %request_id,
            adapter = adapter.name(),
            method = %request.method,
            path = %request.path,
            "dispatching event"
        );

        match self.handler.handle(request).await {
            Ok(response) => {
                debug!(
                    request_id = %request_id,
                    status = response.status_code,
                    "handler completed"
                );
                Ok(adapter.get_response(ResponseProps {
                    event,
                    response: &response,
                })?)
            }
            Err(handler_error) => {
                warn!(
                    request_id = %request_id,
                    adapter = adapter.name(),
                    error = %handler_error,
                    "handler failed, building error response"
                );
                let (resolver, receiver) = ResponseResolver::channel();
                adapter.on_error_while_forwarding(ForwardErrorProps {
                    event,
                    error: &handler_error,
                    resolver,
                    respond_with_errors: self.respond_with_errors,
                });
                receiver.await.map_err(|_| {
                    error!(request_id = %request_id, "adapter dropped the resolver");
                    DispatchError::Unresolved
                })
            }
        }
    }
}
