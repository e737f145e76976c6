//! JSON output.

use crate::format::{FormatError, Formatter};
use crate::riap::CallResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, result: &CallResult) -> Result<Vec<u8>, FormatError> {
        Ok(serde_json::to_vec(result)?)
    }
}
