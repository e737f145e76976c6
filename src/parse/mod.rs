//! Request normalization.
//!
//! # Data Flow
//! ```text
//! HTTP request parts + body bytes
//!     → headers.rs     X-Riap-* keys                 (highest precedence)
//!     → body.rs        JSON / YAML body as args
//!     → uri_pattern.rs named captures of first matching pattern
//!     → query.rs       query string + urlencoded form
//!     → path_info.rs   positional args from residual path (lowest)
//!     → defaults       v = 1.1, action = call, fmt = default_format
//!     → RpcRequest
//! ```
//!
//! # Design Decisions
//! - A field set by a higher-precedence source is never overwritten
//! - Malformed input fails fast with a [`ClientError`]
//! - Normalization holds no mutable state; same input, same record

pub(crate) mod body;
pub(crate) mod draft;
pub(crate) mod headers;
pub mod path_info;
pub(crate) mod query;
pub mod uri_pattern;

use std::sync::Arc;

use axum::http::request::Parts;
use serde_json::Value;

use crate::config::ParseRequestConfig;
use crate::error::ClientError;
use crate::riap::uri::with_default_scheme;
use crate::riap::{ArgSchemaSource, RpcRequest};

use self::body::BodyParsers;
use self::draft::Draft;
pub use self::uri_pattern::{CaptureTransform, PatternMatch, UriPattern};

/// The request normalizer.
///
/// Built once at startup from [`ParseRequestConfig`] and shared through an
/// `Arc` by the parse-request middleware.
#[derive(Clone)]
pub struct ParseRequest {
    patterns: Vec<UriPattern>,
    default_format: String,
    body_parsers: BodyParsers,
    parse_path_info: bool,
    max_body_size: usize,
    schema: Option<Arc<dyn ArgSchemaSource>>,
}

impl ParseRequest {
    /// Compile the configured URI patterns.
    pub fn from_config(config: &ParseRequestConfig) -> Result<Self, regex::Error> {
        let patterns = config
            .uri_patterns
            .iter()
            .map(|p| UriPattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            default_format: config.default_format.clone(),
            body_parsers: BodyParsers {
                accept_yaml: config.accept_yaml,
                parse_form: config.parse_form,
            },
            parse_path_info: config.parse_path_info,
            max_body_size: config.max_body_size,
            schema: None,
        })
    }

    /// Replace the URI patterns, e.g. with ones that carry transforms.
    pub fn with_patterns(mut self, patterns: Vec<UriPattern>) -> Self {
        self.patterns = patterns;
        self
    }

    /// Source of positional argument metadata for path-info parsing.
    pub fn with_schema_source(mut self, schema: Arc<dyn ArgSchemaSource>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }

    pub fn patterns(&self) -> &[UriPattern] {
        &self.patterns
    }

    /// Build the canonical record for one request.
    pub fn normalize(&self, parts: &Parts, body: &[u8]) -> Result<RpcRequest, ClientError> {
        let mut draft = Draft::default();

        headers::apply(&mut draft, &parts.headers)?;
        let form = body::apply(&mut draft, &parts.headers, body, self.body_parsers)?;
        let residual = self.apply_uri_patterns(&mut draft, parts.uri.path())?;

        if self.body_parsers.parse_form {
            if let Some(query) = parts.uri.query() {
                query::apply(&mut draft, query)?;
            }
            if let Some(form) = form {
                query::apply(&mut draft, &form)?;
            }
        }

        if self.parse_path_info {
            if let Some(residual) = residual {
                path_info::apply(&mut draft, &residual, self.schema.as_deref())?;
            }
        }

        draft.finish(&self.default_format)
    }

    /// Merge captures of the first matching pattern; returns the residual path.
    fn apply_uri_patterns(&self, draft: &mut Draft, path: &str) -> Result<Option<String>, ClientError> {
        if self.patterns.is_empty() {
            return Ok(None);
        }
        let matched = self
            .patterns
            .iter()
            .find_map(|p| p.matches(path))
            .ok_or_else(|| ClientError::NoUriPatternMatch {
                path: path.to_string(),
                patterns: self
                    .patterns
                    .iter()
                    .map(UriPattern::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;

        for (key, value) in matched.captures {
            let value = if key == "uri" {
                with_default_scheme(&value)
            } else {
                value
            };
            draft.set(&key, Value::String(value))?;
        }
        Ok(matched.residual)
    }
}

impl std::fmt::Debug for ParseRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseRequest")
            .field("patterns", &self.patterns)
            .field("default_format", &self.default_format)
            .field("body_parsers", &self.body_parsers)
            .field("parse_path_info", &self.parse_path_info)
            .field("max_body_size", &self.max_body_size)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}
