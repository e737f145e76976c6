//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the Riap
//! middleware stack. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RiapConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request normalization settings.
    pub parse_request: ParseRequestConfig,

    /// Call dispatch settings.
    pub serve_call: ServeCallConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Request normalization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParseRequestConfig {
    /// Ordered regexes matched against the request path; first match wins.
    /// Named captures become Riap keys. An empty list disables matching.
    pub uri_patterns: Vec<String>,

    /// Output format when the client names none.
    pub default_format: String,

    /// Parse `text/yaml` request bodies.
    pub accept_yaml: bool,

    /// Merge query string and urlencoded form fields into args.
    pub parse_form: bool,

    /// Map the residual path onto positional arguments.
    pub parse_path_info: bool,

    /// Largest request body read, in bytes.
    pub max_body_size: usize,
}

impl Default for ParseRequestConfig {
    fn default() -> Self {
        Self {
            uri_patterns: vec![r"^(?P<uri>/[^?]*)".to_string()],
            default_format: "json".to_string(),
            accept_yaml: false,
            parse_form: true,
            parse_path_info: false,
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Call dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServeCallConfig {
    /// Time limit per call in seconds (0 = no limit).
    pub time_limit_secs: u64,

    /// Output formats the dispatcher may produce.
    pub formats: FormatsConfig,
}

/// Enabled output formats.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormatsConfig {
    pub json: bool,
    pub yaml: bool,
    pub php: bool,
}

impl FormatsConfig {
    /// True if `name` is a known format that is switched on.
    pub fn allows(&self, name: &str) -> bool {
        match name {
            "json" => self.json,
            "yaml" => self.yaml,
            "php" => self.php,
            _ => false,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.json || self.yaml || self.php
    }
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            json: true,
            yaml: true,
            php: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Emit one access-log event per request.
    pub access_log: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            access_log: true,
        }
    }
}
