//! The adapter contract — the polymorphic seam between hosting platforms and
//! the canonical request/response model.
//!
//! Every platform gets one [`Adapter`] implementation. The dispatcher probes
//! [`Adapter::can_handle`] to pick exactly one adapter per event, so the
//! recognition predicates of the registered set must be mutually exclusive.

pub mod http_api;
pub mod rest_api;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{error, warn};

use crate::types::{Headers, HttpRequest, HttpResponse, ResponseBody};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors an adapter can produce.
///
/// Translation fails only on contract misuse. Malformed sub-fields inside a
/// recognized event degrade to absent or default values instead.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// `get_request` was invoked with an event this adapter never accepted
    /// in `can_handle`.
    #[error("adapter `{adapter}` cannot translate this event")]
    UnrecognizedEvent {
        /// Name of the adapter that refused the event.
        adapter: &'static str,
    },
    /// The platform response failed to serialize.
    #[error("platform response serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Contract inputs
// ---------------------------------------------------------------------------

/// Inputs to [`Adapter::get_response`].
#[derive(Debug)]
pub struct ResponseProps<'a> {
    /// The original platform event the response answers.
    pub event: &'a Value,
    /// Canonical response produced by the downstream handler.
    pub response: &'a HttpResponse,
}

/// Inputs to [`Adapter::on_error_while_forwarding`].
#[derive(Debug)]
pub struct ForwardErrorProps<'a> {
    /// The original platform event.
    pub event: &'a Value,
    /// The downstream handler's failure.
    pub error: &'a anyhow::Error,
    /// Single-use handle that completes the in-flight exchange.
    pub resolver: ResponseResolver,
    /// Include the error's diagnostic detail in the response body. Off by
    /// default so stack traces never reach untrusted clients.
    pub respond_with_errors: bool,
}

/// Single-use completion handle for an in-flight response exchange.
///
/// Wraps a oneshot sender; resolving consumes the handle, so an exchange can
/// be completed at most once by construction.
#[derive(Debug)]
pub struct ResponseResolver {
    tx: oneshot::Sender<Value>,
}

impl ResponseResolver {
    /// Create a resolver and the receiving end the dispatcher awaits.
    pub fn channel() -> (Self, oneshot::Receiver<Value>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Complete the exchange with a platform-shaped response.
    pub fn resolve(self, response: Value) {
        if self.tx.send(response).is_err() {
            warn!("response exchange was abandoned before resolution");
        }
    }
}

// ---------------------------------------------------------------------------
// The contract
// ---------------------------------------------------------------------------

/// Capability contract implemented by every platform adapter.
///
/// Implementations are immutable after construction and hold configuration
/// only, so one instance is safely shared across arbitrarily many concurrent
/// requests. Every method is a pure function of its explicit inputs; none
/// suspends, blocks, or performs I/O.
pub trait Adapter: Send + Sync {
    /// Stable identifier for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Structural type guard: does this event belong to this platform?
    ///
    /// Checks platform-unique marker fields only. Never panics; malformed
    /// input is a recognition miss, not an error.
    fn can_handle(&self, event: &Value) -> bool;

    /// Translate a recognized platform event into a canonical request.
    fn get_request(&self, event: &Value) -> Result<HttpRequest, AdapterError>;

    /// Reconstruct a canonical response into the platform's wire shape.
    fn get_response(&self, props: ResponseProps<'_>) -> Result<Value, AdapterError>;

    /// Complete the exchange after the downstream handler failed.
    ///
    /// Builds a 500 response whose body carries the error's detail only when
    /// `respond_with_errors` is set, then resolves the exchange
    /// unconditionally. Even when response construction itself fails, a
    /// generic failure response goes out.
    fn on_error_while_forwarding(&self, props: ForwardErrorProps<'_>) {
        let detail = if props.respond_with_errors {
            format!("{:#}", props.error)
        } else {
            String::new()
        };
        let fallback = HttpResponse {
            status_code: 500,
            headers: Headers::new(),
            body: if detail.is_empty() {
                None
            } else {
                Some(ResponseBody::Text(detail))
            },
            is_base64_encoded: false,
        };
        let platform = self
            .get_response(ResponseProps {
                event: props.event,
                response: &fallback,
            })
            .unwrap_or_else(|e| {
                error!(
                    adapter = self.name(),
                    error = %e,
                    "error fallback failed to build, sending generic response"
                );
                serde_json::json!({ "statusCode": 500, "headers": {}, "body": "" })
            });
        props.resolver.resolve(platform);
    }
}

// ---------------------------------------------------------------------------
// Shared deserialization plumbing
// ---------------------------------------------------------------------------

/// Deserialize an optional event field, degrading to `None` when the field
/// is present but malformed. Keeps translation from failing on
/// malformed-but-recognized events.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
