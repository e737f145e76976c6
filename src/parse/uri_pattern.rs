//! URI pattern matching.
//!
//! # Responsibilities
//! - Match the request path against an ordered list of regexes
//! - Turn named captures into Riap keys (`uri`, `fmt`, ...)
//! - Produce the residual path used for positional arguments
//!
//! # Design Decisions
//! - First matching pattern wins
//! - A pattern may carry a transform that edits the captures before merge
//! - The capture `path_info` is reserved for the residual path; without it
//!   the unmatched tail of the path is used

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// Name of the capture holding the residual path.
pub const PATH_INFO: &str = "path_info";

/// Edits the named captures of a matched pattern in place.
pub type CaptureTransform = Arc<dyn Fn(&mut BTreeMap<String, String>) + Send + Sync>;

/// A compiled URI pattern with an optional capture transform.
#[derive(Clone)]
pub struct UriPattern {
    regex: Regex,
    transform: Option<CaptureTransform>,
}

/// Outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatternMatch {
    /// Named captures, minus `path_info`.
    pub captures: BTreeMap<String, String>,
    pub residual: Option<String>,
}

impl UriPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            transform: None,
        })
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&mut BTreeMap<String, String>) + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn matches(&self, path: &str) -> Option<PatternMatch> {
        let caps = self.regex.captures(path)?;
        let mut captures: BTreeMap<String, String> = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();

        if let Some(transform) = &self.transform {
            transform(&mut captures);
        }

        let tail = caps.get(0).map(|m| &path[m.end()..]).unwrap_or_default();
        let residual = captures
            .remove(PATH_INFO)
            .or_else(|| (!tail.is_empty()).then(|| tail.to_string()))
            .filter(|r| !r.is_empty());

        Some(PatternMatch { captures, residual })
    }
}

impl fmt::Debug for UriPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UriPattern")
            .field("regex", &self.regex.as_str())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_capture() {
        let pattern = UriPattern::new(r"^(?P<uri>/[^?]*)").unwrap();
        let m = pattern.matches("/Foo/bar").unwrap();
        assert_eq!(m.captures.get("uri").map(String::as_str), Some("/Foo/bar"));
        assert_eq!(m.residual, None);
    }

    #[test]
    fn test_no_match() {
        let pattern = UriPattern::new(r"^/api(?P<uri>/.*)").unwrap();
        assert!(pattern.matches("/x").is_none());
    }

    #[test]
    fn test_unmatched_tail_is_residual() {
        let pattern = UriPattern::new(r"^(?P<uri>/[^/]+/[^/]+)").unwrap();
        let m = pattern.matches("/Math/add/10.5/20.5").unwrap();
        assert_eq!(m.captures["uri"], "/Math/add");
        assert_eq!(m.residual.as_deref(), Some("/10.5/20.5"));
    }

    #[test]
    fn test_explicit_path_info_capture() {
        let pattern = UriPattern::new(r"^/api(?P<uri>/[^/]+/[^/]+)(?:/-(?P<path_info>/.*))?$").unwrap();
        let m = pattern.matches("/api/Math/add/-/1/2").unwrap();
        assert_eq!(m.captures["uri"], "/Math/add");
        assert_eq!(m.residual.as_deref(), Some("/1/2"));
        assert!(!m.captures.contains_key(PATH_INFO));

        let bare = pattern.matches("/api/Math/add").unwrap();
        assert_eq!(bare.residual, None);
    }

    #[test]
    fn test_transform_edits_captures() {
        let pattern = UriPattern::new(r"^/(?P<module>\w+)\.(?P<func>\w+)$")
            .unwrap()
            .with_transform(|caps| {
                let uri = format!("/{}/{}", caps["module"], caps["func"]);
                caps.remove("module");
                caps.remove("func");
                caps.insert("uri".into(), uri);
            });
        let m = pattern.matches("/Math.add").unwrap();
        assert_eq!(m.captures.len(), 1);
        assert_eq!(m.captures["uri"], "/Math/add");
    }
}
