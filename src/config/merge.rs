//! Deep merge of configuration trees.
//!
//! Used to materialise an overlay into a single document for rendering.
//! Lookups never go through this path; they walk fragments directly.
//! Lists are replaced entirely, not concatenated.

use super::value::{ConfigTree, ConfigValue};

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Trees are merged recursively: keys in overlay override keys in base
/// - Lists, strings, numbers and booleans are replaced entirely
///
/// # Example
/// ```
/// use persistence_config::config::{deep_merge, ConfigTree, ConfigValue};
///
/// let mut base = ConfigTree::new();
/// base.insert("port", 8080i64);
/// base.insert("host", "localhost");
/// let mut overlay = ConfigTree::new();
/// overlay.insert("port", 9000i64);
///
/// let merged = deep_merge(base.into(), overlay.into());
/// let tree = merged.as_tree().unwrap();
/// assert_eq!(tree.get("port"), Some(&ConfigValue::from(9000i64)));
/// assert_eq!(tree.get("host"), Some(&ConfigValue::from("localhost")));
/// ```
pub fn deep_merge(base: ConfigValue, overlay: ConfigValue) -> ConfigValue {
    match (base, overlay) {
        // Both are trees: merge recursively
        (ConfigValue::Tree(base_tree), ConfigValue::Tree(overlay_tree)) => {
            ConfigValue::Tree(merge_trees(base_tree, overlay_tree))
        }
        // Any other case: overlay replaces base entirely
        (_, overlay) => overlay,
    }
}

/// Merge two trees key by key, with `overlay` taking precedence.
///
/// Keys that exist only in `base` keep their position; new keys from
/// `overlay` are appended.
pub fn merge_trees(mut base: ConfigTree, overlay: ConfigTree) -> ConfigTree {
    for (key, overlay_value) in overlay {
        let merged_value = match base.get_mut(&key) {
            Some(slot) => {
                let existing = std::mem::take(slot);
                deep_merge(existing, overlay_value)
            }
            None => overlay_value,
        };
        base.insert(key, merged_value);
    }
    base
}

/// Merge multiple trees in order, with later trees taking precedence.
///
/// Equivalent to folding `merge_trees` over the list.
pub fn deep_merge_all(trees: impl IntoIterator<Item = ConfigTree>) -> ConfigTree {
    trees.into_iter().fold(ConfigTree::new(), merge_trees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys::{DOT_DELIMITER, expand};

    fn tree(pairs: Vec<(&str, ConfigValue)>) -> ConfigTree {
        expand(pairs, DOT_DELIMITER).unwrap()
    }

    #[test]
    fn test_merge_simple_trees() {
        let base = tree(vec![("a", 1i64.into()), ("b", 2i64.into())]);
        let overlay = tree(vec![("b", 3i64.into()), ("c", 4i64.into())]);
        let result = merge_trees(base, overlay);
        assert_eq!(
            result.to_json(),
            serde_json::json!({"a": 1, "b": 3, "c": 4})
        );
    }

    #[test]
    fn test_merge_nested_trees() {
        let base = tree(vec![
            ("server.host", "localhost".into()),
            ("server.port", 8080i64.into()),
            ("debug", true.into()),
        ]);
        let overlay = tree(vec![("server.port", 9000i64.into())]);
        let result = merge_trees(base, overlay);
        assert_eq!(
            result.to_json(),
            serde_json::json!({
                "server": {"host": "localhost", "port": 9000},
                "debug": true
            })
        );
    }

    #[test]
    fn test_lists_replaced_not_merged() {
        let base = tree(vec![
            ("items.0", "a".into()),
            ("items.1", "b".into()),
            ("items.2", "c".into()),
        ]);
        let overlay = tree(vec![("items.0", "x".into())]);
        let result = merge_trees(base, overlay);
        assert_eq!(result.to_json(), serde_json::json!({"items": ["x"]}));
    }

    #[test]
    fn test_merge_all() {
        let trees = vec![
            tree(vec![("a", 1i64.into())]),
            tree(vec![("b", 2i64.into())]),
            tree(vec![("a", 3i64.into()), ("c", 4i64.into())]),
        ];
        let result = deep_merge_all(trees);
        assert_eq!(
            result.to_json(),
            serde_json::json!({"a": 3, "b": 2, "c": 4})
        );
    }

    #[test]
    fn test_overlay_replaces_leaf_with_tree() {
        let base = tree(vec![("value", 42i64.into())]);
        let overlay = tree(vec![("value.nested", true.into())]);
        let result = merge_trees(base, overlay);
        assert_eq!(
            result.to_json(),
            serde_json::json!({"value": {"nested": true}})
        );
    }

    #[test]
    fn test_overlay_replaces_tree_with_leaf() {
        let base = tree(vec![("value.nested", true.into())]);
        let overlay = tree(vec![("value", 42i64.into())]);
        let result = merge_trees(base, overlay);
        assert_eq!(result.to_json(), serde_json::json!({"value": 42}));
    }
}
