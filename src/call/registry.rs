//! In-process function registry.
//!
//! Functions are registered under their path (`/Math/add`) together with
//! their argument metadata. The registry is both a [`Caller`] and the
//! [`ArgSchemaSource`] used for positional path arguments.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::call::{CallError, CallFuture, CallLogger, CallRequest, Caller};
use crate::riap::{ArgSchemaSource, ArgSpec, CallResult, TargetUri};

type Function = Arc<dyn Fn(Map<String, Value>, CallLogger) -> CallFuture + Send + Sync>;

#[derive(Clone)]
struct Entry {
    specs: Vec<ArgSpec>,
    function: Function,
}

#[derive(Clone, Default)]
pub struct Registry {
    functions: HashMap<String, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` at `path`. Returns `self` for chaining.
    pub fn register<F, Fut>(mut self, path: &str, specs: Vec<ArgSpec>, function: F) -> Self
    where
        F: Fn(Map<String, Value>, CallLogger) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CallResult, CallError>> + Send + 'static,
    {
        let wrapped: Function = Arc::new(move |args: Map<String, Value>, logger: CallLogger| -> CallFuture {
            Box::pin(function(args, logger))
        });
        self.functions.insert(path.to_string(), Entry { specs, function: wrapped });
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.functions.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Replace RFC 3339 strings in date/time arguments with epoch seconds.
fn convert_datetime_args(specs: &[ArgSpec], args: &mut Map<String, Value>) -> Result<(), CallError> {
    for spec in specs.iter().filter(|s| s.datetime) {
        let Some(Value::String(raw)) = args.get(&spec.name) else {
            continue;
        };
        let parsed = DateTime::parse_from_rfc3339(raw).map_err(|e| CallError::InvalidArgument {
            name: spec.name.clone(),
            reason: e.to_string(),
        })?;
        args.insert(spec.name.clone(), Value::from(parsed.timestamp()));
    }
    Ok(())
}

impl Caller for Registry {
    fn call(&self, request: CallRequest) -> CallFuture {
        let Some(entry) = self.functions.get(request.target.path()) else {
            let uri = request.target.to_string();
            return Box::pin(async move { Ok(CallResult::new(404, format!("Function not found: {uri}"))) });
        };

        let mut args = request.args;
        if request.options.convert_datetime_args {
            if let Err(e) = convert_datetime_args(&entry.specs, &mut args) {
                return Box::pin(async move { Ok(CallResult::new(400, e.to_string())) });
            }
        }

        tracing::debug!(
            module = %request.target.module(),
            function = %request.target.function(),
            "Invoking registered function"
        );
        (entry.function)(args, request.logger)
    }
}

impl ArgSchemaSource for Registry {
    fn arg_specs(&self, uri: &str) -> Option<Vec<ArgSpec>> {
        let target = TargetUri::parse(uri).ok()?;
        self.functions.get(target.path()).map(|e| e.specs.clone())
    }
}
