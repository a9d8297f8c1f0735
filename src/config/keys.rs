//! Key-path expansion.
//!
//! Turns a flat mapping whose keys encode a path (`AKKA__TEST_VALUE__0`,
//! `akka.cluster.roles[1]`) into a nested [`ConfigTree`]:
//!
//! - Keys are split on a delimiter and each segment is canonicalised to
//!   lower-case kebab form (`TestValue` -> `test-value`).
//! - Integer-keyed subtrees collapse into lists ordered by ascending index.
//!   Gaps do not reserve slots, so `{0, 1, 22}` becomes a three-element list.
//! - A prefix used both as a leaf and as a branch is a [`ConfigError::MalformedKey`].

use super::value::{ConfigTree, ConfigValue};
use crate::error::{ConfigError, ConfigResult};
use heck::ToKebabCase;
use std::collections::BTreeMap;
use tracing::debug;

/// Segment delimiter used by environment-variable style keys.
pub const ENV_DELIMITER: &str = "__";

/// Segment delimiter used by dotted document keys.
pub const DOT_DELIMITER: &str = ".";

/// Canonical casing for one path segment.
///
/// Integer segments (including negative ones) are kept verbatim so that list
/// indices and signed keys survive canonicalisation.
pub fn canonical_segment(segment: &str) -> String {
    if is_integer(segment) {
        return segment.to_string();
    }
    segment.to_kebab_case()
}

fn is_integer(segment: &str) -> bool {
    let digits = segment.strip_prefix('-').unwrap_or(segment);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a list index: non-negative decimal digits only.
fn list_index(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Split a raw key into canonical segments.
///
/// Bracket indices are rewritten to delimiter form first, so `roles[0]`
/// and `roles.0` address the same element.
pub fn split_key(raw_key: &str, delimiter: &str) -> ConfigResult<Vec<String>> {
    if delimiter.is_empty() {
        return Err(ConfigError::malformed_key(raw_key, "empty delimiter"));
    }
    let normalized = raw_key.replace('[', delimiter).replace(']', "");
    normalized
        .split(delimiter)
        .map(|segment| {
            let canonical = canonical_segment(segment.trim());
            if canonical.is_empty() {
                Err(ConfigError::malformed_key(raw_key, "empty path segment"))
            } else {
                Ok(canonical)
            }
        })
        .collect()
}

/// Expand a flat mapping into a nested tree.
///
/// Keys are processed in sorted order so the result does not depend on the
/// iteration order of the input. Any error aborts the whole expansion.
///
/// Integer keys only order the elements of a collapsed list; they are not
/// kept. After `{0, 1, 22}` collapses, the third element is addressed as
/// position `2` and a lookup of `22` finds nothing. Callers that need the
/// original numbers should avoid gaps, or use a non-numeric key so the
/// subtree stays a map.
pub fn expand<I, K, V>(flat: I, delimiter: &str) -> ConfigResult<ConfigTree>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ConfigValue>,
{
    let sorted: BTreeMap<String, ConfigValue> = flat
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect();

    let mut root = ConfigTree::new();
    for (raw_key, value) in &sorted {
        let segments = split_key(raw_key, delimiter)?;
        insert_path(&mut root, raw_key, &segments, value.clone())?;
    }

    debug!(keys = sorted.len(), delimiter, "Expanded flat configuration");
    Ok(collapse_children(root))
}

fn insert_path(
    root: &mut ConfigTree,
    raw_key: &str,
    segments: &[String],
    value: ConfigValue,
) -> ConfigResult<()> {
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(ConfigError::malformed_key(raw_key, "empty key"));
    };

    let mut node = root;
    for segment in parents {
        if !node.contains_key(segment) {
            node.insert(segment.clone(), ConfigTree::new());
        }
        node = match node.get_mut(segment) {
            Some(ConfigValue::Tree(tree)) => tree,
            _ => {
                return Err(ConfigError::malformed_key(
                    raw_key,
                    format!("'{}' is already a value and cannot hold children", segment),
                ));
            }
        };
    }

    match node.get(leaf) {
        Some(ConfigValue::Tree(_)) => Err(ConfigError::malformed_key(
            raw_key,
            format!("'{}' is already a branch and cannot hold a value", leaf),
        )),
        Some(_) => Err(ConfigError::malformed_key(
            raw_key,
            format!("'{}' is defined more than once", leaf),
        )),
        None => {
            node.insert(leaf.clone(), value);
            Ok(())
        }
    }
}

/// Collapse integer-keyed subtrees beneath `tree`, keeping `tree` itself a map.
fn collapse_children(tree: ConfigTree) -> ConfigTree {
    tree.into_iter()
        .map(|(key, value)| (key, collapse(value)))
        .collect()
}

fn collapse(value: ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Tree(tree) => {
            let tree = collapse_children(tree);
            match into_list(tree) {
                Ok(items) => ConfigValue::List(items),
                Err(tree) => ConfigValue::Tree(tree),
            }
        }
        ConfigValue::List(items) => ConfigValue::List(items.into_iter().map(collapse).collect()),
        scalar => scalar,
    }
}

/// Convert a tree whose keys are all distinct non-negative integers into a
/// list ordered by index. Returns the tree unchanged otherwise.
fn into_list(tree: ConfigTree) -> Result<Vec<ConfigValue>, ConfigTree> {
    if tree.is_empty() {
        return Err(tree);
    }
    let indices: Option<Vec<u64>> = tree.keys().map(list_index).collect();
    let Some(indices) = indices else {
        return Err(tree);
    };
    let mut unique = indices.clone();
    unique.sort_unstable();
    unique.dedup();
    if unique.len() != indices.len() {
        // "1" and "01" name the same slot
        return Err(tree);
    }

    let mut indexed: Vec<(u64, ConfigValue)> = indices
        .into_iter()
        .zip(tree.into_iter().map(|(_, value)| value))
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, value)| value).collect())
}

/// Flatten a tree back into delimiter-joined keys, depth first.
///
/// List elements use their position as segment. Empty trees and lists have
/// no leaves and produce no keys.
pub fn flatten(tree: &ConfigTree, delimiter: &str) -> Vec<(String, ConfigValue)> {
    let mut out = Vec::new();
    for (key, value) in tree.iter() {
        flatten_into(key.to_string(), value, delimiter, &mut out);
    }
    out
}

fn flatten_into(
    prefix: String,
    value: &ConfigValue,
    delimiter: &str,
    out: &mut Vec<(String, ConfigValue)>,
) {
    match value {
        ConfigValue::Tree(tree) => {
            for (key, child) in tree.iter() {
                flatten_into(format!("{}{}{}", prefix, delimiter, key), child, delimiter, out);
            }
        }
        ConfigValue::List(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(format!("{}{}{}", prefix, delimiter, index), child, delimiter, out);
            }
        }
        scalar => out.push((prefix, scalar.clone())),
    }
}
