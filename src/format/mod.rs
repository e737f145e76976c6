//! Output formatters.
//!
//! # Responsibilities
//! - Serialize a [`CallResult`] envelope into response bytes
//! - Report the content type for each format
//!
//! # Design Decisions
//! - Static registry: format name → formatter, no runtime dispatch by name
//! - Unknown names are a lookup failure (`None`)
//! - Which formats are served is decided by config, not here

pub mod json;
pub mod php;
pub mod yaml;

use thiserror::Error;

use crate::riap::CallResult;

pub use self::json::JsonFormatter;
pub use self::php::PhpFormatter;
pub use self::yaml::YamlFormatter;

/// Names of every format this crate can produce.
pub const KNOWN_FORMATS: &[&str] = &["json", "yaml", "php"];

/// Serializer failure.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML encoding failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Encoded response body with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub body: Vec<u8>,
    pub content_type: &'static str,
}

/// A wire format for call results.
pub trait Formatter: Send + Sync {
    fn name(&self) -> &'static str;

    fn content_type(&self) -> &'static str;

    fn encode(&self, result: &CallResult) -> Result<Vec<u8>, FormatError>;

    fn format(&self, result: &CallResult) -> Result<Formatted, FormatError> {
        Ok(Formatted {
            body: self.encode(result)?,
            content_type: self.content_type(),
        })
    }
}

static JSON: JsonFormatter = JsonFormatter;
static YAML: YamlFormatter = YamlFormatter;
static PHP: PhpFormatter = PhpFormatter;

/// Look up a formatter by format name.
pub fn lookup(name: &str) -> Option<&'static dyn Formatter> {
    match name {
        "json" => Some(&JSON),
        "yaml" => Some(&YAML),
        "php" => Some(&PHP),
        _ => None,
    }
}
