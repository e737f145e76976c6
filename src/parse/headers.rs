//! Riap keys carried in `X-Riap-*` headers.
//!
//! `X-Riap-Log-Level: info` sets key `log_level`. A trailing `-j-`
//! (`X-Riap-Args-j-: {"a":1}`) marks a JSON-encoded value.

use axum::http::HeaderMap;
use serde_json::Value;

use crate::error::ClientError;
use crate::parse::draft::Draft;

const HEADER_PREFIX: &str = "x-riap-";
const JSON_SUFFIX: &str = "-j-";

/// Map a lower-cased header name to its Riap key and JSON flag.
fn riap_key(name: &str) -> Option<(String, bool)> {
    let rest = name.strip_prefix(HEADER_PREFIX)?;
    let (key, json) = match rest.strip_suffix(JSON_SUFFIX) {
        Some(key) => (key, true),
        None => (rest, false),
    };
    if key.is_empty() {
        return None;
    }
    Some((key.replace('-', "_"), json))
}

pub(crate) fn apply(draft: &mut Draft, headers: &HeaderMap) -> Result<(), ClientError> {
    for (name, value) in headers {
        let Some((key, json)) = riap_key(name.as_str()) else {
            continue;
        };
        let raw = value.to_str().map_err(|_| ClientError::HeaderEncoding {
            header: name.to_string(),
        })?;
        let value = if json {
            serde_json::from_str(raw).map_err(|source| ClientError::HeaderJson {
                header: name.to_string(),
                source,
            })?
        } else {
            Value::String(raw.to_string())
        };
        draft.set(&key, value)?;
    }
    Ok(())
}
