//! HTTP (v2) payload adapter.
//!
//! Translates the `version: "2.0"` payload shape that HTTP-style gateways
//! deliver: method nested under `requestContext.http`, a raw path plus a raw
//! query string passed through verbatim, cookies split out of the header map,
//! and a response shape whose header map cannot repeat keys (multi-value
//! `set-cookie` travels in a dedicated `cookies` array instead).

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::{lenient, Adapter, AdapterError, ResponseProps};
use crate::encoding::{decode_body, default_if_undefined, flatten_headers, forwarded_for};
use crate::types::{Headers, HttpRequest, OneOrMany, ResponseBody};

/// Stable adapter identifier.
const ADAPTER_NAME: &str = "http-api";

/// Method used when a recognized event is missing its request context.
const FALLBACK_METHOD: &str = "GET";

// ---------------------------------------------------------------------------
// Event shape (minimal subset)
// ---------------------------------------------------------------------------

/// The v2 payload, limited to the fields translation needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpApiEvent {
    #[serde(default, deserialize_with = "lenient")]
    raw_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    raw_query_string: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    cookies: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient")]
    headers: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "lenient")]
    body: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    is_base64_encoded: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    request_context: Option<HttpApiRequestContext>,
}

/// Request context wrapper around the nested `http` block.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpApiRequestContext {
    http: HttpApiRequestContextHttp,
}

/// The nested `http` block carrying the method.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HttpApiRequestContextHttp {
    method: String,
}

/// The v2 platform response shape. The header map is single-valued;
/// `set-cookie` values travel in the `cookies` array.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HttpApiResponse {
    status_code: u16,
    headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cookies: Vec<String>,
    body: String,
    is_base64_encoded: bool,
}

// ---------------------------------------------------------------------------
// Adapter implementation
// ---------------------------------------------------------------------------

/// Adapter for the HTTP (v2) payload shape.
///
/// Carries no configuration: the v2 payload delivers its query string
/// pre-encoded, so there is nothing to reconstruct and nothing to strip.
#[derive(Debug, Clone, Default)]
pub struct HttpApiAdapter;

impl HttpApiAdapter {
    /// Create the adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Adapter for HttpApiAdapter {
    fn name(&self) -> &'static str {
        ADAPTER_NAME
    }

    fn can_handle(&self, event: &Value) -> bool {
        event.get("version").and_then(Value::as_str) == Some("2.0")
            && event.get("routeKey").is_some_and(Value::is_string)
    }

    fn get_request(&self, event: &Value) -> Result<HttpRequest, AdapterError> {
        let event = HttpApiEvent::deserialize(event).map_err(|_| {
            AdapterError::UnrecognizedEvent {
                adapter: ADAPTER_NAME,
            }
        })?;

        let method = event
            .request_context
            .as_ref()
            .map(|ctx| ctx.http.method.clone());
        let method = default_if_undefined(method, FALLBACK_METHOD.to_string());

        let path = default_if_undefined(event.raw_path.clone(), "/".to_string());
        let path = if path.is_empty() { "/".to_string() } else { path };
        // The raw query string is already percent-encoded; pass it through.
        let path = match event.raw_query_string.as_deref() {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path,
        };

        let mut headers = Headers::new();
        if let Some(flat) = &event.headers {
            for (key, value) in flat {
                headers.insert(key.to_ascii_lowercase(), OneOrMany::Single(value.clone()));
            }
        }
        if let Some(cookies) = &event.cookies {
            if !cookies.is_empty() {
                headers.insert(
                    "cookie".to_string(),
                    OneOrMany::Single(cookies.join("; ")),
                );
            }
        }

        let is_base64_encoded = default_if_undefined(event.is_base64_encoded, false);
        let body = decode_body(event.body.as_deref(), is_base64_encoded);
        if let Some(bytes) = &body {
            headers.insert(
                "content-length".to_string(),
                OneOrMany::Single(bytes.len().to_string()),
            );
        }

        let remote_address = forwarded_for(&headers);

        Ok(HttpRequest {
            method,
            path,
            headers,
            body,
            remote_address,
        })
    }

    fn get_response(&self, props: ResponseProps<'_>) -> Result<Value, AdapterError> {
        let response = props.response;

        // The v2 header map cannot repeat keys, so set-cookie values are
        // carried in the dedicated cookies array.
        let mut cookies = Vec::new();
        let mut headers = Headers::new();
        for (key, value) in &response.headers {
            if key.eq_ignore_ascii_case("set-cookie") {
                match value {
                    OneOrMany::Single(v) => cookies.push(v.clone()),
                    OneOrMany::Multiple(vs) => cookies.extend(vs.iter().cloned()),
                }
            } else {
                headers.insert(key.clone(), value.clone());
            }
        }

        let (body, is_base64_encoded) = match &response.body {
            None => (String::new(), false),
            Some(ResponseBody::Text(text)) => (text.clone(), response.is_base64_encoded),
            Some(ResponseBody::Binary(bytes)) => (STANDARD.encode(bytes), true),
        };

        let platform = HttpApiResponse {
            status_code: response.status_code,
            headers: flatten_headers(&headers),
            cookies,
            body,
            is_base64_encoded,
        };
        Ok(serde_json::to_value(platform)?)
    }
}
