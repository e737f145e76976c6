//! Request body parsing, keyed by content type.

use axum::http::{header, HeaderMap};
use serde_json::Value;

use crate::error::ClientError;
use crate::parse::draft::Draft;

/// Body parsers that may be enabled besides JSON.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BodyParsers {
    pub accept_yaml: bool,
    pub parse_form: bool,
}

/// Bare media type: lower-cased, parameters stripped.
fn media_type(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = raw.split(';').next().unwrap_or_default().trim();
    Some(essence.to_ascii_lowercase())
}

/// Parse the body into `args`.
///
/// Returns the raw form payload for urlencoded bodies; those are merged
/// with the query string later, at form precedence.
pub(crate) fn apply(
    draft: &mut Draft,
    headers: &HeaderMap,
    body: &[u8],
    parsers: BodyParsers,
) -> Result<Option<String>, ClientError> {
    if body.is_empty() {
        return Ok(None);
    }
    let Some(content_type) = media_type(headers) else {
        return Ok(None);
    };

    let args: Value = match content_type.as_str() {
        "application/json" => serde_json::from_slice(body).map_err(ClientError::BodyJson)?,
        "text/yaml" | "application/yaml" | "application/x-yaml" if parsers.accept_yaml => {
            serde_yaml::from_slice(body).map_err(ClientError::BodyYaml)?
        }
        "application/x-www-form-urlencoded" if parsers.parse_form => {
            return Ok(Some(String::from_utf8_lossy(body).into_owned()));
        }
        _ => return Err(ClientError::UnsupportedContentType(content_type)),
    };

    draft.set("args", args)?;
    Ok(None)
}
