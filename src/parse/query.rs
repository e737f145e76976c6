//! Query string and urlencoded form fields.
//!
//! - `a=1` sets argument `a` to the string `"1"`
//! - `b:j=[2,3]` sets argument `b` to decoded JSON
//! - `-riap-log-level=info` sets Riap key `log_level` (`-j-` suffix for JSON)

use serde_json::Value;

use crate::error::ClientError;
use crate::parse::draft::Draft;

const OPTION_PREFIX: &str = "-riap-";
const ARG_JSON_SUFFIX: &str = ":j";
const OPTION_JSON_SUFFIX: &str = "_j_";

fn decode_json(key: &str, raw: &str) -> Result<Value, ClientError> {
    serde_json::from_str(raw).map_err(|source| ClientError::QueryJson {
        key: key.to_string(),
        source,
    })
}

pub(crate) fn apply(draft: &mut Draft, encoded: &str) -> Result<(), ClientError> {
    for (key, value) in url::form_urlencoded::parse(encoded.as_bytes()) {
        if let Some(option) = key.strip_prefix(OPTION_PREFIX) {
            let name = option.to_ascii_lowercase().replace('-', "_");
            match name.strip_suffix(OPTION_JSON_SUFFIX) {
                Some(stripped) => draft.set(stripped, decode_json(&key, &value)?)?,
                None => draft.set(&name, Value::String(value.into_owned()))?,
            }
        } else if let Some(arg) = key.strip_suffix(ARG_JSON_SUFFIX) {
            let decoded = decode_json(&key, &value)?;
            draft.merge_arg(arg, decoded);
        } else {
            draft.merge_arg(&key, Value::String(value.into_owned()));
        }
    }
    Ok(())
}
