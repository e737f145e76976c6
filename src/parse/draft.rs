//! Accumulating record used while a request is being normalized.
//!
//! Sources are applied from highest to lowest precedence, so every setter
//! here only fills empty slots.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::riap::{Action, RpcRequest, DEFAULT_VERSION};

#[derive(Debug, Default)]
pub(crate) struct Draft {
    fields: BTreeMap<String, Value>,
    args: Option<Map<String, Value>>,
}

/// `output_format` is accepted as a spelled-out alias of `fmt`.
fn canonical_key(key: &str) -> &str {
    match key {
        "output_format" => "fmt",
        other => other,
    }
}

impl Draft {
    /// Set a Riap key unless a higher-precedence source already did.
    pub(crate) fn set(&mut self, key: &str, value: Value) -> Result<(), ClientError> {
        let key = canonical_key(key);
        if key == "args" {
            let Value::Object(map) = value else {
                return Err(ClientError::ArgsNotMapping);
            };
            if self.args.is_none() {
                self.args = Some(map);
            }
            return Ok(());
        }
        self.fields.entry(key.to_string()).or_insert(value);
        Ok(())
    }

    /// Add one argument unless that key is already present.
    pub(crate) fn merge_arg(&mut self, key: &str, value: Value) {
        self.args
            .get_or_insert_with(Map::new)
            .entry(key.to_string())
            .or_insert(value);
    }

    pub(crate) fn uri(&self) -> Option<&str> {
        self.fields.get("uri").and_then(Value::as_str)
    }

    /// Apply defaults and split typed fields from free-form options.
    pub(crate) fn finish(self, default_fmt: &str) -> Result<RpcRequest, ClientError> {
        let mut fields = self.fields;
        let v = take_scalar(&mut fields, "v")?.unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let action = take_scalar(&mut fields, "action")?
            .map(|a| Action::parse(&a))
            .unwrap_or_default();
        let uri = take_scalar(&mut fields, "uri")?;
        let fmt = take_scalar(&mut fields, "fmt")?.unwrap_or_else(|| default_fmt.to_string());

        Ok(RpcRequest {
            v,
            action,
            uri,
            fmt,
            args: self.args,
            options: fields,
        })
    }
}

fn take_scalar(fields: &mut BTreeMap<String, Value>, key: &str) -> Result<Option<String>, ClientError> {
    match fields.remove(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ClientError::InvalidField {
            key: key.to_string(),
        }),
    }
}
