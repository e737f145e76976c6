//! Target URI handling.
//!
//! Only the `pm:` scheme (a function inside a module tree) is callable:
//! `pm:/Math/Stats/mean` names function `mean` in module `Math::Stats`.

use std::fmt;

/// Scheme this crate can dispatch calls to.
pub const PM_SCHEME: &str = "pm";

/// Returns true if `uri` starts with `<scheme>:` where the scheme is a word.
pub fn has_scheme(uri: &str) -> bool {
    match uri.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Prefix `pm:` unless the URI already names a scheme.
pub fn with_default_scheme(uri: &str) -> String {
    if has_scheme(uri) {
        uri.to_string()
    } else {
        format!("{PM_SCHEME}:{uri}")
    }
}

/// A parsed, callable `pm:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUri {
    path: String,
    split: usize,
}

impl TargetUri {
    /// Parse a function URI. Package URIs (trailing slash) and other schemes
    /// are rejected with a human readable reason.
    pub fn parse(uri: &str) -> Result<Self, String> {
        let (scheme, path) = uri
            .split_once(':')
            .filter(|_| has_scheme(uri))
            .ok_or_else(|| "missing scheme".to_string())?;
        if scheme != PM_SCHEME {
            return Err(format!("unsupported scheme '{scheme}'"));
        }
        if !path.starts_with('/') {
            return Err("path must be absolute".to_string());
        }
        let split = path.rfind('/').unwrap_or(0);
        let function = &path[split + 1..];
        if function.is_empty() {
            return Err("does not name a function".to_string());
        }
        if !function.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(format!("invalid function name '{function}'"));
        }
        Ok(Self {
            path: path.to_string(),
            split,
        })
    }

    /// Path part, e.g. `/Math/add`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Module name with `::` separators; empty for top-level functions.
    pub fn module(&self) -> String {
        self.path[..self.split]
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("::")
    }

    pub fn function(&self) -> &str {
        &self.path[self.split + 1..]
    }
}

impl fmt::Display for TargetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PM_SCHEME}:{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_detection() {
        assert!(has_scheme("pm:/Foo/bar"));
        assert!(has_scheme("http://x"));
        assert!(!has_scheme("/Foo/bar"));
        assert!(!has_scheme("/a:b"));
        assert_eq!(with_default_scheme("/Foo/bar"), "pm:/Foo/bar");
        assert_eq!(with_default_scheme("pm:/Foo/bar"), "pm:/Foo/bar");
    }

    #[test]
    fn test_parse_function_uri() {
        let uri = TargetUri::parse("pm:/Math/Stats/mean").unwrap();
        assert_eq!(uri.module(), "Math::Stats");
        assert_eq!(uri.function(), "mean");
        assert_eq!(uri.path(), "/Math/Stats/mean");
        assert_eq!(uri.to_string(), "pm:/Math/Stats/mean");

        let top = TargetUri::parse("pm:/hello").unwrap();
        assert_eq!(top.module(), "");
        assert_eq!(top.function(), "hello");
    }

    #[test]
    fn test_parse_rejects() {
        assert!(TargetUri::parse("/Math/add").is_err());
        assert!(TargetUri::parse("http://x/add").is_err());
        assert!(TargetUri::parse("pm:/Math/").is_err());
        assert!(TargetUri::parse("pm:Math/add").is_err());
        assert!(TargetUri::parse("pm:/Math/a-b").is_err());
    }
}
