//! YAML output.

use crate::format::{FormatError, Formatter};
use crate::riap::CallResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormatter;

impl Formatter for YamlFormatter {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn content_type(&self) -> &'static str {
        "text/yaml"
    }

    fn encode(&self, result: &CallResult) -> Result<Vec<u8>, FormatError> {
        Ok(serde_yaml::to_string(result)?.into_bytes())
    }
}
