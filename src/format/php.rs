//! PHP `serialize()` output.
//!
//! JSON arrays become PHP lists (`a:<n>:{i:0;...}`), objects become
//! associative arrays keyed by string. String lengths are in bytes.

use std::fmt::Write;

use serde_json::Value;

use crate::format::{FormatError, Formatter};
use crate::riap::CallResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct PhpFormatter;

impl Formatter for PhpFormatter {
    fn name(&self) -> &'static str {
        "php"
    }

    fn content_type(&self) -> &'static str {
        "application/vnd.php.serialized"
    }

    fn encode(&self, result: &CallResult) -> Result<Vec<u8>, FormatError> {
        let value = serde_json::to_value(result)?;
        let mut out = String::new();
        serialize(&value, &mut out);
        Ok(out.into_bytes())
    }
}

fn serialize_str(s: &str, out: &mut String) {
    let _ = write!(out, "s:{}:\"{}\";", s.len(), s);
}

/// Append the PHP serialization of `value` to `out`.
pub fn serialize(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("N;"),
        Value::Bool(b) => {
            let _ = write!(out, "b:{};", u8::from(*b));
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                let _ = write!(out, "i:{i};");
            } else if let Some(u) = n.as_u64() {
                let _ = write!(out, "i:{u};");
            } else {
                let _ = write!(out, "d:{};", n.as_f64().unwrap_or_default());
            }
        }
        Value::String(s) => serialize_str(s, out),
        Value::Array(items) => {
            let _ = write!(out, "a:{}:{{", items.len());
            for (i, item) in items.iter().enumerate() {
                let _ = write!(out, "i:{i};");
                serialize(item, out);
            }
            out.push('}');
        }
        Value::Object(map) => {
            let _ = write!(out, "a:{}:{{", map.len());
            for (key, item) in map {
                serialize_str(key, out);
                serialize(item, out);
            }
            out.push('}');
        }
    }
}
