//! Canonical request/response model shared by every adapter.
//!
//! Adapters normalize platform events *into* these shapes and reconstruct
//! platform responses *out of* them. The downstream handler never sees a
//! platform-specific field.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A header or query-parameter value: one string, or an ordered list.
///
/// Mirrors the `string | string[]` reality of the platform wire formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single value.
    Single(String),
    /// Multiple values in their original order.
    Multiple(Vec<String>),
}

impl OneOrMany {
    /// Join the value(s) into one delimited string, preserving order.
    pub fn join(&self, separator: &str) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Multiple(values) => values.join(separator),
        }
    }
}

/// Header map. Canonical request headers store keys lowercased; response
/// header casing is whatever the handler chose.
pub type Headers = HashMap<String, OneOrMany>;

/// Platform-neutral request handed to the downstream handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP method as the platform reported it.
    pub method: String,
    /// Request path with any query string already merged in.
    pub path: String,
    /// Headers with lowercased keys.
    pub headers: Headers,
    /// Raw body bytes. `None` when the event carried no body.
    #[serde(default)]
    pub body: Option<Vec<u8>>,
    /// Client address reported by a forwarding proxy, when present.
    #[serde(default)]
    pub remote_address: Option<String>,
}

/// Body of a canonical response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Text payload, emitted on the wire as-is.
    Text(String),
    /// Raw bytes; adapters base64-encode these for JSON wire shapes.
    Binary(Vec<u8>),
}

/// Platform-neutral response produced by the downstream handler (or by the
/// error fallback path).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code in the 100–599 range.
    pub status_code: u16,
    /// Headers; multi-values are flattened per platform on the way out.
    pub headers: Headers,
    /// Response payload, if any.
    pub body: Option<ResponseBody>,
    /// Whether a text body already holds base64-encoded payload.
    pub is_base64_encoded: bool,
}

impl HttpResponse {
    /// A bare response with the given status and nothing else.
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Headers::new(),
            body: None,
            is_base64_encoded: false,
        }
    }
}
