//! Positional arguments from the residual request path.
//!
//! `/10.5/20.5` against a function declaring `a` (pos 0) and `b` (pos 1)
//! yields `{a: 10.5, b: 20.5}`. A greedy argument swallows the remaining
//! segments as an array.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::{Number, Value};

use crate::error::ClientError;
use crate::parse::draft::Draft;
use crate::riap::ArgSchemaSource;

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+|\d*\.\d+|\d+\.)(?:[eE][+-]?\d+)?$").expect("numeric pattern is valid")
});

/// Convert numeric-looking strings to JSON numbers; keep everything else.
pub fn coerce_numeric(segment: &str) -> Value {
    if !NUMERIC.is_match(segment) {
        return Value::String(segment.to_string());
    }
    let integral = !segment.contains(['.', 'e', 'E']);
    if integral {
        if let Ok(i) = segment.parse::<i64>() {
            return Value::Number(i.into());
        }
    }
    segment
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(segment.to_string()))
}

fn segments(residual: &str) -> Result<Vec<Value>, ClientError> {
    residual
        .split('/')
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(index, raw)| {
            let decoded = percent_decode_str(raw)
                .decode_utf8()
                .map_err(|_| ClientError::PathSegmentEncoding { index })?;
            Ok(coerce_numeric(&decoded))
        })
        .collect()
}

pub(crate) fn apply(
    draft: &mut Draft,
    residual: &str,
    schema: Option<&dyn ArgSchemaSource>,
) -> Result<(), ClientError> {
    let values = segments(residual)?;
    if values.is_empty() {
        return Ok(());
    }

    let uri = draft.uri().ok_or(ClientError::PathInfoWithoutUri)?.to_string();
    let specs = schema
        .and_then(|s| s.arg_specs(&uri))
        .ok_or_else(|| ClientError::UnknownTarget { uri: uri.clone() })?;

    let mut index = 0;
    while index < values.len() {
        let spec = specs
            .iter()
            .find(|s| s.pos == Some(index))
            .ok_or(ClientError::ExtraPathSegment { index })?;
        if spec.greedy {
            draft.merge_arg(&spec.name, Value::Array(values[index..].to_vec()));
            break;
        }
        draft.merge_arg(&spec.name, values[index].clone());
        index += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::riap::ArgSpec;
    use serde_json::json;

    struct Fixed(Vec<ArgSpec>);

    impl ArgSchemaSource for Fixed {
        fn arg_specs(&self, uri: &str) -> Option<Vec<ArgSpec>> {
            (uri == "pm:/Math/add").then(|| self.0.clone())
        }
    }

    fn draft_for(uri: &str) -> Draft {
        let mut draft = Draft::default();
        draft.set("uri", json!(uri)).unwrap();
        draft
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("10"), json!(10));
        assert_eq!(coerce_numeric("-3"), json!(-3));
        assert_eq!(coerce_numeric("10.5"), json!(10.5));
        assert_eq!(coerce_numeric(".5"), json!(0.5));
        assert_eq!(coerce_numeric("1e3"), json!(1000.0));
        assert_eq!(coerce_numeric("abc"), json!("abc"));
        assert_eq!(coerce_numeric("1.2.3"), json!("1.2.3"));
        assert_eq!(coerce_numeric(""), json!(""));
    }

    #[test]
    fn test_positional_args() {
        let schema = Fixed(vec![ArgSpec::new("b").pos(1), ArgSpec::new("a").pos(0)]);
        let mut draft = draft_for("pm:/Math/add");
        apply(&mut draft, "/10.5/20.5", Some(&schema)).unwrap();
        let req = draft.finish("json").unwrap();
        assert_eq!(json!(req.args), json!({"a": 10.5, "b": 20.5}));
    }

    #[test]
    fn test_greedy_and_decoding() {
        let schema = Fixed(vec![ArgSpec::new("op").pos(0), ArgSpec::new("nums").pos(1).greedy()]);
        let mut draft = draft_for("pm:/Math/add");
        apply(&mut draft, "/hello%20there/1/2/x", Some(&schema)).unwrap();
        let req = draft.finish("json").unwrap();
        assert_eq!(json!(req.args), json!({"op": "hello there", "nums": [1, 2, "x"]}));
    }

    #[test]
    fn test_errors() {
        let schema = Fixed(vec![ArgSpec::new("a").pos(0)]);

        let mut draft = draft_for("pm:/Math/add");
        let err = apply(&mut draft, "/1/2", Some(&schema)).unwrap_err();
        assert!(matches!(err, ClientError::ExtraPathSegment { index: 1 }));

        let mut draft = draft_for("pm:/Math/sub");
        let err = apply(&mut draft, "/1", Some(&schema)).unwrap_err();
        assert!(matches!(err, ClientError::UnknownTarget { .. }));

        let mut draft = Draft::default();
        let err = apply(&mut draft, "/1", Some(&schema)).unwrap_err();
        assert!(matches!(err, ClientError::PathInfoWithoutUri));
    }

    #[test]
    fn test_empty_residual_needs_no_schema() {
        let mut draft = Draft::default();
        apply(&mut draft, "/", None).unwrap();
        assert!(draft.finish("json").unwrap().args.is_none());
    }
}
