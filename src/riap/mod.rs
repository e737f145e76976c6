//! Riap protocol types.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → parse (RequestNormalizer) builds RpcRequest
//!     → call (CallDispatcher) resolves TargetUri, runs the call
//!     → CallResult envelope [status, message, payload?, meta?]
//!     → format (json / yaml / php)
//! ```
//!
//! # Design Decisions
//! - RpcRequest is immutable once normalized
//! - Unknown Riap keys are kept verbatim in `options`
//! - Argument schemas are supplied by the call mechanism, not this crate

pub mod request;
pub mod result;
pub mod schema;
pub mod uri;

pub use request::{Action, RpcRequest, DEFAULT_VERSION};
pub use result::CallResult;
pub use schema::{ArgSchemaSource, ArgSpec};
pub use uri::TargetUri;

use serde_json::Value;

/// Loose truthiness for option values that may arrive as strings from
/// headers or query parameters.
///
/// `null`, `false`, `0`, `""` and `"0"` are false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("0")));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));

        assert!(is_truthy(&json!("1")));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!([])));
    }
}
