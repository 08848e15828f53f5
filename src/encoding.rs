//! Pure encoding helpers shared by the concrete adapters.
//!
//! Base64-aware body decoding, multi-value header flattening, and path+query
//! reconstruction. Every function here is a pure function of its inputs.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::warn;
use url::form_urlencoded;

use crate::types::OneOrMany;

/// Decode a platform-delivered body into raw bytes.
///
/// Base64-flagged bodies are decoded; anything else is taken as UTF-8 text.
/// Absent or empty bodies yield `None`, telling the caller not to touch
/// body-related headers. The decoded length is what belongs in
/// `content-length`, never the encoded string length.
///
/// A body flagged base64 that does not actually decode degrades to the raw
/// string's bytes rather than failing translation.
pub fn decode_body(raw: Option<&str>, is_base64_encoded: bool) -> Option<Vec<u8>> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    if is_base64_encoded {
        match STANDARD.decode(raw) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "body flagged base64 but failed to decode, passing raw bytes through");
                Some(raw.as_bytes().to_vec())
            }
        }
    } else {
        Some(raw.as_bytes().to_vec())
    }
}

/// Flatten a multi-value header map into one string per key.
///
/// Multi-values are joined with `,` in their original order; single values
/// pass through unchanged. Key casing is preserved as given; platforms that
/// expect canonical casing normalize separately.
pub fn flatten_headers(headers: &HashMap<String, OneOrMany>) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(key, value)| (key.clone(), value.join(",")))
        .collect()
}

/// Rebuild a request path with its query string appended.
///
/// Keys and values are percent-encoded; multi-value parameters are emitted as
/// repeated `key=value` pairs in their original order. An empty parameter
/// list yields the bare path with no trailing `?`.
pub fn path_with_query(path: &str, params: &[(String, OneOrMany)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        match value {
            OneOrMany::Single(v) => {
                serializer.append_pair(key, v);
            }
            OneOrMany::Multiple(vs) => {
                for v in vs {
                    serializer.append_pair(key, v);
                }
            }
        }
    }
    let query = serializer.finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

/// First hop of the `x-forwarded-for` chain, if a forwarding proxy reported
/// one.
///
/// Returns `None` when the header is absent or empty; no synthetic default
/// address is invented.
pub fn forwarded_for(headers: &HashMap<String, OneOrMany>) -> Option<String> {
    let value = headers.get("x-forwarded-for")?;
    let joined = value.join(",");
    let first = joined.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

/// Return `value`, or `fallback` only when `value` is absent.
///
/// Empty strings, zero, and `false` are values, not absence.
pub fn default_if_undefined<T>(value: Option<T>, fallback: T) -> T {
    value.unwrap_or(fallback)
}
