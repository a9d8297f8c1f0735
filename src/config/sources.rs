//! Raw configuration sources.
//!
//! Each source is reduced to a flat mapping and handed to
//! [`expand`](super::keys::expand):
//! - JSON and YAML documents are flattened to dotted keys (array elements
//!   become index segments, nulls are treated as "not specified")
//! - Environment variables use `__` as segment delimiter and are filtered by
//!   a case-insensitive prefix that stays part of the path

use super::keys::{DOT_DELIMITER, ENV_DELIMITER, canonical_segment, expand};
use super::value::{ConfigTree, ConfigValue};
use crate::error::{ConfigError, ConfigResult};
use serde_json::Value;
use tracing::debug;

/// Flatten a JSON document into dotted keys.
///
/// Returns an error if the document root is not an object.
pub fn flatten_json(document: &Value) -> ConfigResult<Vec<(String, ConfigValue)>> {
    let Value::Object(map) = document else {
        return Err(ConfigError::parse(
            "json",
            "document root must be an object",
        ));
    };
    let mut out = Vec::new();
    for (key, value) in map {
        flatten_json_into(key.clone(), value, &mut out);
    }
    Ok(out)
}

fn flatten_json_into(prefix: String, value: &Value, out: &mut Vec<(String, ConfigValue)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix, ConfigValue::Boolean(*b))),
        Value::Number(n) => out.push((prefix, ConfigValue::Number(n.clone()))),
        Value::String(s) => out.push((prefix, ConfigValue::String(s.clone()))),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_json_into(format!("{}{}{}", prefix, DOT_DELIMITER, index), item, out);
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                flatten_json_into(format!("{}{}{}", prefix, DOT_DELIMITER, key), child, out);
            }
        }
    }
}

/// Build a tree from a parsed JSON document.
pub fn from_json(document: &Value) -> ConfigResult<ConfigTree> {
    expand(flatten_json(document)?, DOT_DELIMITER)
}

/// Parse JSON text into a tree.
pub fn parse_json(text: &str) -> ConfigResult<ConfigTree> {
    let document: Value = serde_json::from_str(text).map_err(|e| ConfigError::parse("json", e))?;
    from_json(&document)
}

/// Parse YAML text into a tree.
///
/// An empty document yields an empty tree.
pub fn parse_yaml(text: &str) -> ConfigResult<ConfigTree> {
    let document: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::parse("yaml", e))?;
    if document.is_null() {
        return Ok(ConfigTree::new());
    }
    from_json(&document)
}

/// Build a tree from environment-style variables.
///
/// Only variables whose first segment matches `prefix` (after
/// canonicalisation) are kept; the prefix remains the root segment, so
/// `AKKA__LOGLEVEL` under prefix `akka` lands at `akka.loglevel`.
pub fn from_env_vars<I, K, V>(vars: I, prefix: &str) -> ConfigResult<ConfigTree>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let wanted = canonical_segment(prefix);
    let matching: Vec<(String, ConfigValue)> = vars
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .filter(|(key, _)| {
            key.split(ENV_DELIMITER)
                .next()
                .is_some_and(|first| canonical_segment(first) == wanted)
        })
        .map(|(key, value)| (key, ConfigValue::String(value)))
        .collect();

    debug!(prefix = %wanted, count = matching.len(), "Collected environment variables");
    expand(matching, ENV_DELIMITER)
}

/// Build a tree from the current process environment.
///
/// Variables whose name or value is not valid UTF-8 are skipped.
pub fn from_process_env(prefix: &str) -> ConfigResult<ConfigTree> {
    let vars = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
    from_env_vars(vars, prefix)
}
