//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every URI pattern up front
//! - Check the default output format is one the dispatcher will serve
//! - Validate value ranges (body size > 0, bind address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RiapConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::RiapConfig;
use crate::format;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("parse_request.uri_patterns[{index}] does not compile: {reason}")]
    UriPattern { index: usize, reason: String },

    #[error("parse_request.default_format '{0}' is unknown or disabled")]
    DefaultFormat(String),

    #[error("parse_request.max_body_size must be greater than zero")]
    MaxBodySize,

    #[error("serve_call.formats enables no output format")]
    NoFormats,

    #[error("observability.log_level '{level}' is not a valid filter: {reason}")]
    LogLevel { level: String, reason: String },
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &RiapConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let parse = &config.parse_request;
    for (index, pattern) in parse.uri_patterns.iter().enumerate() {
        if let Err(e) = regex::Regex::new(pattern) {
            errors.push(ValidationError::UriPattern {
                index,
                reason: e.to_string(),
            });
        }
    }

    let formats = &config.serve_call.formats;
    if !formats.allows(&parse.default_format) || format::lookup(&parse.default_format).is_none() {
        errors.push(ValidationError::DefaultFormat(parse.default_format.clone()));
    }

    if parse.max_body_size == 0 {
        errors.push(ValidationError::MaxBodySize);
    }

    if !formats.any_enabled() {
        errors.push(ValidationError::NoFormats);
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::LogLevel {
            level: config.observability.log_level.clone(),
            reason: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
