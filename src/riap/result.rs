//! Call result envelope.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{Map, Value};

/// Result of a Riap call: `[status, message, payload?, meta?]`.
///
/// Opaque to the dispatcher; it is handed to the formatter as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResult {
    pub status: u16,
    pub message: String,
    pub payload: Option<Value>,
    pub meta: Option<Map<String, Value>>,
}

impl CallResult {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            payload: None,
            meta: None,
        }
    }

    /// `[200, "OK", payload]`
    pub fn ok(payload: Value) -> Self {
        Self::new(200, "OK").with_payload(payload)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    /// The call did not finish within its time limit.
    pub fn timed_out() -> Self {
        Self::new(500, "Execution timed out")
    }

    /// The call mechanism or the called function failed.
    pub fn exception(message: impl std::fmt::Display) -> Self {
        Self::new(500, format!("Exception: {message}"))
    }

    /// The call ended without a result and without a failure.
    pub fn bug() -> Self {
        Self::new(500, "BUG")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl Serialize for CallResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = match (&self.payload, &self.meta) {
            (_, Some(_)) => 4,
            (Some(_), None) => 3,
            (None, None) => 2,
        };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.status)?;
        seq.serialize_element(&self.message)?;
        if len >= 3 {
            seq.serialize_element(&self.payload)?;
        }
        if let Some(meta) = &self.meta {
            seq.serialize_element(meta)?;
        }
        seq.end()
    }
}
