//! Argument metadata supplied by the call mechanism.

/// One declared function argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: String,
    /// Position when the argument may be passed positionally.
    pub pos: Option<usize>,
    /// Collects this and every following positional value into an array.
    pub greedy: bool,
    /// Value is a date/time; RFC 3339 strings may be converted to epoch seconds.
    pub datetime: bool,
}

impl ArgSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pos: None,
            greedy: false,
            datetime: false,
        }
    }

    pub fn pos(mut self, pos: usize) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn greedy(mut self) -> Self {
        self.greedy = true;
        self
    }

    pub fn datetime(mut self) -> Self {
        self.datetime = true;
        self
    }
}

/// Source of argument metadata for a target URI.
pub trait ArgSchemaSource: Send + Sync {
    /// Declared arguments of the function at `uri`, or `None` if unknown.
    fn arg_specs(&self, uri: &str) -> Option<Vec<ArgSpec>>;
}
