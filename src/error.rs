//! Client-visible error definitions.
//!
//! Every variant here stops the pipeline before a call is attempted and is
//! rendered through the content-negotiated error page
//! (see [`crate::http::error_page`]).

use axum::http::StatusCode;
use thiserror::Error;

/// Malformed or unsupported client input.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A Riap header carried bytes that are not visible ASCII.
    #[error("Invalid value encoding in HTTP header {header}")]
    HeaderEncoding { header: String },

    /// A `-j-` header did not hold valid JSON.
    #[error("Invalid JSON in HTTP header {header}: {source}")]
    HeaderJson {
        header: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body could not be read (too large or broken stream).
    #[error("Can't read request body: {0}")]
    BodyRead(String),

    /// The body content type has no parser enabled.
    #[error("Unsupported request content type '{0}'")]
    UnsupportedContentType(String),

    #[error("Invalid JSON in request body: {0}")]
    BodyJson(#[source] serde_json::Error),

    #[error("Invalid YAML in request body: {0}")]
    BodyYaml(#[source] serde_yaml::Error),

    /// `args` was supplied as something other than a key/value mapping.
    #[error("args must be hash (JSON object)")]
    ArgsNotMapping,

    /// A scalar Riap key (`v`, `action`, `uri`, `fmt`) had a non-scalar value.
    #[error("Riap request key '{key}' must be a string")]
    InvalidField { key: String },

    /// None of the configured URI patterns matched the request path.
    #[error("Request path '{path}' does not match uri_pattern {patterns}")]
    NoUriPatternMatch { path: String, patterns: String },

    #[error("Invalid JSON in query parameter {key}: {source}")]
    QueryJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Can't parse path info: no target uri")]
    PathInfoWithoutUri,

    #[error("Can't parse path info: no argument metadata for {uri}")]
    UnknownTarget { uri: String },

    #[error("Path segment #{index} does not map to a positional argument")]
    ExtraPathSegment { index: usize },

    #[error("Path segment #{index} is not valid UTF-8 after decoding")]
    PathSegmentEncoding { index: usize },

    /// Requested output format is unknown or disabled.
    #[error("Unknown output format '{0}'")]
    UnknownFormat(String),

    #[error("Invalid log_level '{0}', use one of fatal, error, warn, info, debug, trace")]
    InvalidLogLevel(String),

    #[error("Invalid target uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
}

impl ClientError {
    /// HTTP status used for the error page.
    pub fn status(&self) -> StatusCode {
        match self {
            ClientError::NoUriPatternMatch { .. } | ClientError::UnknownTarget { .. } => {
                StatusCode::NOT_FOUND
            }
            ClientError::UnknownFormat(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = ClientError::NoUriPatternMatch {
            path: "/x".into(),
            patterns: "^/api".into(),
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(err.to_string().contains("uri_pattern"));

        assert_eq!(ClientError::ArgsNotMapping.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ClientError::UnknownFormat("xml".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
