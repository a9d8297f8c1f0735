//! Configuration values and trees.
//!
//! Leaves ingested from raw sources stay untyped (text or number). Typed
//! coercion happens at read time in [`super::accessor`].

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Number;
use std::fmt;

/// Separator for dotted lookup paths (`a.b.c`).
pub const PATH_SEPARATOR: char = '.';

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    String(String),
    Number(Number),
    Boolean(bool),
    List(Vec<ConfigValue>),
    Tree(ConfigTree),
}

impl ConfigValue {
    /// Name of the structural kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::String(_) => "string",
            ConfigValue::Number(_) => "number",
            ConfigValue::Boolean(_) => "boolean",
            ConfigValue::List(_) => "list",
            ConfigValue::Tree(_) => "tree",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, ConfigValue::List(_) | ConfigValue::Tree(_))
    }

    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            ConfigValue::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text rendering of a scalar; `None` for lists and trees.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::Number(n) => Some(n.to_string()),
            ConfigValue::Boolean(b) => Some(b.to_string()),
            ConfigValue::List(_) | ConfigValue::Tree(_) => None,
        }
    }

    /// Convert to a JSON value (lists become arrays, trees become objects).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConfigValue::String(s) => serde_json::Value::String(s.clone()),
            ConfigValue::Number(n) => serde_json::Value::Number(n.clone()),
            ConfigValue::Boolean(b) => serde_json::Value::Bool(*b),
            ConfigValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ConfigValue::to_json).collect())
            }
            ConfigValue::Tree(tree) => tree.to_json(),
        }
    }
}

impl Default for ConfigValue {
    fn default() -> Self {
        ConfigValue::Tree(ConfigTree::new())
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        // NaN and infinities have no JSON number form
        match Number::from_f64(value) {
            Some(n) => ConfigValue::Number(n),
            None => ConfigValue::String(value.to_string()),
        }
    }
}

impl From<Number> for ConfigValue {
    fn from(value: Number) -> Self {
        ConfigValue::Number(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

impl From<ConfigTree> for ConfigValue {
    fn from(value: ConfigTree) -> Self {
        ConfigValue::Tree(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(value: Vec<T>) -> Self {
        ConfigValue::List(value.into_iter().map(Into::into).collect())
    }
}

/// Ordered mapping from path segment to value.
///
/// Entries keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigTree {
    entries: IndexMap<String, ConfigValue>,
}

/// Outcome of looking a path up in a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathLookup<'a> {
    /// The path is defined here.
    Found(&'a ConfigValue),
    /// A prefix of the path is a list or a leaf in this tree, so the path
    /// cannot be defined anywhere below it.
    Shadowed,
    /// Nothing on the path is defined here. `depth` is the length of the
    /// longest prefix that is a subtree in this tree.
    Absent { depth: usize },
}

impl<'a> PathLookup<'a> {
    pub fn found(self) -> Option<&'a ConfigValue> {
        match self {
            PathLookup::Found(value) => Some(value),
            PathLookup::Shadowed | PathLookup::Absent { .. } => None,
        }
    }
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct child by segment name.
    pub fn get(&self, segment: &str) -> Option<&ConfigValue> {
        self.entries.get(segment)
    }

    pub fn get_mut(&mut self, segment: &str) -> Option<&mut ConfigValue> {
        self.entries.get_mut(segment)
    }

    pub fn contains_key(&self, segment: &str) -> bool {
        self.entries.contains_key(segment)
    }

    /// Insert or replace a direct child, returning the previous value.
    ///
    /// A replaced child keeps its position.
    pub fn insert(
        &mut self,
        segment: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Option<ConfigValue> {
        self.entries.insert(segment.into(), value.into())
    }

    pub fn remove(&mut self, segment: &str) -> Option<ConfigValue> {
        self.entries.shift_remove(segment)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Look up a dotted path (`a.b.c`).
    ///
    /// Descends through nested trees; a numeric segment indexes into a list.
    /// An empty path resolves to nothing.
    pub fn lookup(&self, path: &str) -> Option<&ConfigValue> {
        if path.is_empty() {
            return None;
        }
        let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        self.locate(segments.as_slice()).found()
    }

    /// Look up a path given as segments, telling a path that is absent
    /// apart from one hidden behind a list or leaf prefix.
    ///
    /// Below a list, only the list itself and its existing positions are
    /// defined; any other path under it is [`PathLookup::Shadowed`].
    pub fn locate<S: AsRef<str>>(&self, segments: &[S]) -> PathLookup<'_> {
        self.locate_below(segments, 0)
    }

    /// Like [`locate`](Self::locate), but the first `tree_depth` prefixes
    /// of the path must be subtrees here. A list or leaf at one of those
    /// prefixes reports [`PathLookup::Shadowed`].
    pub fn locate_below<S: AsRef<str>>(
        &self,
        segments: &[S],
        tree_depth: usize,
    ) -> PathLookup<'_> {
        let Some((first, rest)) = segments.split_first() else {
            return PathLookup::Absent { depth: 0 };
        };
        let Some(mut current) = self.get(first.as_ref()) else {
            return PathLookup::Absent { depth: 0 };
        };
        // Once a list has been entered, a miss can no longer fall through
        let mut inside_list = false;
        for (offset, segment) in rest.iter().enumerate() {
            let depth = offset + 1;
            let segment = segment.as_ref();
            let next = match current {
                ConfigValue::Tree(tree) => tree.get(segment),
                _ if depth <= tree_depth => return PathLookup::Shadowed,
                ConfigValue::List(items) => {
                    inside_list = true;
                    segment.parse::<usize>().ok().and_then(|index| items.get(index))
                }
                _ => return PathLookup::Shadowed,
            };
            current = match next {
                Some(value) => value,
                None if inside_list => return PathLookup::Shadowed,
                None => return PathLookup::Absent { depth },
            };
        }
        PathLookup::Found(current)
    }

    /// Convert to a JSON object, keeping entry order.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl IntoIterator for ConfigTree {
    type Item = (String, ConfigValue);
    type IntoIter = indexmap::map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = ConfigTree::new();
        for (key, value) in iter {
            tree.insert(key, value);
        }
        tree
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigTree {
        let mut cluster = ConfigTree::new();
        cluster.insert("roles", vec!["front-end", "back-end"]);
        let mut role = ConfigTree::new();
        role.insert("back-end", 5i64);
        cluster.insert("role", role);

        let mut akka = ConfigTree::new();
        akka.insert("cluster", cluster);

        let mut root = ConfigTree::new();
        root.insert("akka", akka);
        root
    }

    #[test]
    fn test_lookup_nested() {
        let tree = sample();
        assert_eq!(
            tree.lookup("akka.cluster.role.back-end"),
            Some(&ConfigValue::from(5i64))
        );
        assert!(tree.lookup("akka.cluster").unwrap().as_tree().is_some());
        assert!(tree.lookup("akka.missing").is_none());
        assert!(tree.lookup("").is_none());
    }

    #[test]
    fn test_lookup_indexes_lists() {
        let tree = sample();
        assert_eq!(
            tree.lookup("akka.cluster.roles.1"),
            Some(&ConfigValue::from("back-end"))
        );
        assert!(tree.lookup("akka.cluster.roles.2").is_none());
        assert!(tree.lookup("akka.cluster.roles.x").is_none());
    }

    #[test]
    fn test_lookup_through_scalar_is_none() {
        let tree = sample();
        assert!(tree.lookup("akka.cluster.role.back-end.deeper").is_none());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut tree = ConfigTree::new();
        tree.insert("a", "1");
        tree.insert("b", "2");
        let old = tree.insert("a", "3");
        assert_eq!(old, Some(ConfigValue::from("1")));
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(tree.get("a"), Some(&ConfigValue::from("3")));
    }

    #[test]
    fn test_locate_reports_shadowed_paths() {
        let tree = sample();
        assert_eq!(
            tree.locate(&["akka", "cluster", "roles", "0"]),
            PathLookup::Found(&ConfigValue::from("front-end"))
        );
        // Past the end of a list, or a non-index segment under it
        assert_eq!(tree.locate(&["akka", "cluster", "roles", "2"]), PathLookup::Shadowed);
        assert_eq!(tree.locate(&["akka", "cluster", "roles", "name"]), PathLookup::Shadowed);
        // Below a leaf
        assert_eq!(
            tree.locate(&["akka", "cluster", "role", "back-end", "deeper"]),
            PathLookup::Shadowed
        );
        assert_eq!(
            tree.locate(&["akka", "cluster", "missing"]),
            PathLookup::Absent { depth: 2 }
        );
        assert_eq!(tree.locate(&["other"]), PathLookup::Absent { depth: 0 });
    }

    #[test]
    fn test_locate_below_requires_subtrees() {
        let tree = sample();
        // roles is a list, but a higher tree defined it as a subtree
        assert_eq!(
            tree.locate_below(&["akka", "cluster", "roles", "0"], 3),
            PathLookup::Shadowed
        );
        assert_eq!(
            tree.locate_below(&["akka", "cluster", "role", "back-end"], 3),
            PathLookup::Found(&ConfigValue::from(5i64))
        );
    }

    #[test]
    fn test_to_json_keeps_insertion_order() {
        let mut tree = ConfigTree::new();
        tree.insert("zeta", "1");
        tree.insert("alpha", "2");
        tree.insert("mid", "3");
        let json = tree.to_json();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut tree = ConfigTree::new();
        tree.insert("a", "1");
        tree.insert("b", "2");
        tree.insert("c", "3");
        assert_eq!(tree.remove("a"), Some(ConfigValue::from("1")));
        assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_as_text() {
        assert_eq!(ConfigValue::from(5i64).as_text().as_deref(), Some("5"));
        assert_eq!(ConfigValue::from(true).as_text().as_deref(), Some("true"));
        assert_eq!(ConfigValue::from(vec!["a"]).as_text(), None);
    }

    #[test]
    fn test_serialize_preserves_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "akka": {
                    "cluster": {
                        "roles": ["front-end", "back-end"],
                        "role": {"back-end": 5}
                    }
                }
            })
        );
        assert_eq!(json, sample().to_json());
    }
}
