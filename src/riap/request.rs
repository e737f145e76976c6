//! The canonical Riap request record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::riap::is_truthy;

/// Protocol version assumed when the client does not send one.
pub const DEFAULT_VERSION: &str = "1.1";

/// Riap action. Only `call` is served by this crate; anything else is
/// carried through for later stages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Call,
    Other(String),
}

impl Action {
    pub fn parse(s: &str) -> Self {
        if s == "call" {
            Action::Call
        } else {
            Action::Other(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Call => "call",
            Action::Other(s) => s,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Action::Call)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A normalized Riap request.
///
/// Produced once per HTTP request by the normalizer and stored in the
/// request extensions. Serializes to the flat Riap hash form
/// (`{"v": .., "action": .., "uri": .., "fmt": .., "args": .., <options>}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    /// Protocol version.
    pub v: String,

    pub action: Action,

    /// Target URI, e.g. `pm:/Math/add`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    /// Output format name.
    pub fmt: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, Value>>,

    /// Every other Riap key (`log_level`, `mark_log`, extensions).
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl RpcRequest {
    /// A bare `call` request for `uri` with default version and format.
    pub fn call(uri: impl Into<String>, fmt: impl Into<String>) -> Self {
        Self {
            v: DEFAULT_VERSION.to_string(),
            action: Action::Call,
            uri: Some(uri.into()),
            fmt: fmt.into(),
            args: None,
            options: BTreeMap::new(),
        }
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Requested log streaming level, unvalidated.
    pub fn log_level(&self) -> Option<&Value> {
        self.option("log_level")
    }

    /// Whether log lines and the result should carry `L` / `R` markers.
    pub fn mark_log(&self) -> bool {
        self.option("mark_log").map(is_truthy).unwrap_or(false)
    }
}
