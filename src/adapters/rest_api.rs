//! REST (v1) proxy event adapter.
//!
//! Translates the `httpMethod`/`requestContext` proxy payload that REST-style
//! API gateways deliver to function runtimes. This shape carries all the v1
//! quirks: base64-flagged bodies, parallel flat and multi-value header maps,
//! query maps that must be re-encoded into the path, and an optional
//! configured base path to strip for custom-domain mounting.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adapters::{lenient, Adapter, AdapterError, ResponseProps};
use crate::encoding::{
    decode_body, default_if_undefined, flatten_headers, forwarded_for, path_with_query,
};
use crate::types::{Headers, HttpRequest, OneOrMany, ResponseBody};

/// Stable adapter identifier.
const ADAPTER_NAME: &str = "rest-api";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// REST adapter configuration, fixed at construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestApiConfig {
    /// Base path stripped from the front of incoming request paths, e.g.
    /// `"/api"` when the gateway mounts the function under a custom-domain
    /// prefix. Matched as a literal anchored prefix, never a pattern.
    /// Default is empty: no stripping.
    pub strip_base_path: String,
}

// ---------------------------------------------------------------------------
// Event shape (minimal subset)
// ---------------------------------------------------------------------------

/// The v1 proxy event, limited to the fields translation needs.
///
/// `httpMethod` is the only hard requirement; everything else degrades to
/// absent when missing or malformed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestApiEvent {
    http_method: String,
    #[serde(default, deserialize_with = "lenient")]
    path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    headers: Option<HashMap<String, String>>,
    #[serde(default, deserialize_with = "lenient")]
    multi_value_headers: Option<HashMap<String, Vec<String>>>,
    #[serde(default, deserialize_with = "lenient")]
    query_string_parameters: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    multi_value_query_string_parameters: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient")]
    body: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    is_base64_encoded: Option<bool>,
}

/// The v1 platform response shape: flattened single-valued headers, string
/// body, explicit base64 flag.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RestApiResponse {
    status_code: u16,
    headers: HashMap<String, String>,
    body: String,
    is_base64_encoded: bool,
}

// ---------------------------------------------------------------------------
// Adapter implementation
// ---------------------------------------------------------------------------

/// Adapter for the REST (v1) proxy event shape.
#[derive(Debug, Clone, Default)]
pub struct RestApiAdapter {
    config: RestApiConfig,
}

impl RestApiAdapter {
    /// Create an adapter with the given configuration.
    pub fn new(config: RestApiConfig) -> Self {
        Self { config }
    }

    /// Strip the configured base path off an incoming path.
    ///
    /// Anchored literal prefix match only: `"/api"` turns `"/api/users"` into
    /// `"/users"` but leaves `"/other/api/x"` untouched. A path equal to the
    /// prefix strips to `"/"`.
    fn stripped_path(&self, path: &str) -> String {
        if self.config.strip_base_path.is_empty() {
            return path.to_string();
        }
        match path.strip_prefix(&self.config.strip_base_path) {
            Some("") => "/".to_string(),
            Some(rest) => rest.to_string(),
            None => path.to_string(),
        }
    }
}

/// Build canonical headers with lowercased keys, preferring the multi-value
/// map when the event carries both.
fn canonical_headers(event: &RestApiEvent) -> Headers {
    let mut headers = Headers::new();
    if let Some(multi) = &event.multi_value_headers {
        for (key, values) in multi {
            headers.insert(key.to_ascii_lowercase(), OneOrMany::Multiple(values.clone()));
        }
    } else if let Some(flat) = &event.headers {
        for (key, value) in flat {
            headers.insert(key.to_ascii_lowercase(), OneOrMany::Single(value.clone()));
        }
    }
    headers
}

/// Collect query parameters in document order, preferring the multi-value
/// map. Entries that are neither strings nor string arrays are dropped.
fn query_params(event: &RestApiEvent) -> Vec<(String, OneOrMany)> {
    let map = event
        .multi_value_query_string_parameters
        .as_ref()
        .or(event.query_string_parameters.as_ref());
    let Some(map) = map else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => OneOrMany::Single(s.clone()),
                Value::Array(items) => OneOrMany::Multiple(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                ),
                _ => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

impl Adapter for RestApiAdapter {
    fn name(&self) -> &'static str {
        ADAPTER_NAME
    }

    fn can_handle(&self, event: &Value) -> bool {
        event.get("httpMethod").is_some_and(Value::is_string)
            && event.get("requestContext").is_some_and(Value::is_object)
    }

    fn get_request(&self, event: &Value) -> Result<HttpRequest, AdapterError> {
        let event = RestApiEvent::deserialize(event).map_err(|_| {
            AdapterError::UnrecognizedEvent {
                adapter: ADAPTER_NAME,
            }
        })?;

        let mut headers = canonical_headers(&event);

        let raw_path = default_if_undefined(event.path.clone(), String::new());
        let path = self.stripped_path(&raw_path);
        let path = if path.is_empty() { "/".to_string() } else { path };
        let path = path_with_query(&path, &query_params(&event));

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
            method: event.http_method,
            path,
            headers,
            body,
            remote_address,
        })
    }

    fn get_response(&self, props: ResponseProps<'_>) -> Result<Value, AdapterError> {
        let response = props.response;
        let (body, is_base64_encoded) = match &response.body {
            None => (String::new(), false),
            Some(ResponseBody::Text(text)) => (text.clone(), response.is_base64_encoded),
            Some(ResponseBody::Binary(bytes)) => (STANDARD.encode(bytes), true),
        };
        let platform = RestApiResponse {
            status_code: response.status_code,
            headers: flatten_headers(&response.headers),
            body,
            is_base64_encoded,
        };
        Ok(serde_json::to_value(platform)?)
    }
}
