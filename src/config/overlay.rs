//! Ordered overlay of configuration fragments.
//!
//! Resolution order, highest priority first:
//! 1. **Prepended fragments** - most recently prepended first
//! 2. **Floor** - the single defaults fragment, always last
//!
//! A lookup returns the value from the first fragment that defines the path
//! at all, leaf or subtree. A subtree resolved directly comes whole from the
//! fragment that wins, and a list is never blended across fragments: once a
//! fragment defines a list (or a leaf) on the path, nothing below it is read
//! from lower fragments. Query paths are canonicalised the same way keys are
//! on expansion, so `Akka.LogLevel` finds `akka.log-level`.

use super::keys::canonical_segment;
use super::merge::deep_merge_all;
use super::value::{ConfigTree, ConfigValue, PATH_SEPARATOR, PathLookup};
use std::path::PathBuf;
use tracing::debug;

/// Where a fragment came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentSource {
    /// Built-in defaults
    Defaults,
    /// A configuration document on disk
    File(PathBuf),
    /// Environment variables
    Environment,
    /// Rendered from typed options (carries the plugin path)
    Options(String),
    /// Constructed in code
    Inline,
}

impl std::fmt::Display for FragmentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentSource::Defaults => write!(f, "defaults"),
            FragmentSource::File(path) => write!(f, "file {}", path.display()),
            FragmentSource::Environment => write!(f, "environment"),
            FragmentSource::Options(plugin) => write!(f, "options ({})", plugin),
            FragmentSource::Inline => write!(f, "inline"),
        }
    }
}

/// One configuration tree contributed by a single source.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    source: FragmentSource,
    tree: ConfigTree,
}

impl Fragment {
    pub fn new(source: FragmentSource, tree: ConfigTree) -> Self {
        Self { source, tree }
    }

    pub fn source(&self) -> &FragmentSource {
        &self.source
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }
}

impl From<ConfigTree> for Fragment {
    fn from(tree: ConfigTree) -> Self {
        Fragment::new(FragmentSource::Inline, tree)
    }
}

/// Ordered list of fragments plus an optional floor.
///
/// Mutation happens only through [`prepend`](Self::prepend) and
/// [`append_floor`](Self::append_floor). There is no internal locking: finish
/// assembly before sharing the overlay across threads.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverlay {
    /// Prepended fragments, index 0 is the highest priority
    fragments: Vec<Fragment>,
    /// Lowest priority fragment
    floor: Option<Fragment>,
}

impl ConfigOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fragment at the highest priority.
    pub fn prepend(&mut self, fragment: impl Into<Fragment>) -> &mut Self {
        let fragment = fragment.into();
        debug!(
            source = %fragment.source,
            keys = fragment.tree.len(),
            "Prepending configuration fragment"
        );
        self.fragments.insert(0, fragment);
        self
    }

    /// Set or replace the lowest priority fragment.
    pub fn append_floor(&mut self, fragment: impl Into<Fragment>) -> &mut Self {
        let fragment = fragment.into();
        if let Some(previous) = &self.floor {
            debug!(
                previous = %previous.source,
                source = %fragment.source,
                "Replacing floor fragment"
            );
        } else {
            debug!(source = %fragment.source, "Setting floor fragment");
        }
        self.floor = Some(fragment);
        self
    }

    /// The floor fragment, if one is set.
    pub fn floor(&self) -> Option<&Fragment> {
        self.floor.as_ref()
    }

    /// All fragments in resolution order, floor last.
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter().chain(self.floor.iter())
    }

    /// Number of fragments, floor included.
    pub fn len(&self) -> usize {
        self.fragments.len() + usize::from(self.floor.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a dotted path. `None` means no fragment defines it.
    pub fn resolve(&self, path: &str) -> Option<&ConfigValue> {
        self.resolve_with_source(path).map(|(value, _)| value)
    }

    /// Resolve a dotted path and report which fragment supplied the value.
    pub fn resolve_with_source(&self, path: &str) -> Option<(&ConfigValue, &FragmentSource)> {
        if path.is_empty() {
            return None;
        }
        let segments: Vec<String> = path.split(PATH_SEPARATOR).map(canonical_segment).collect();
        // Prefixes that a higher fragment already defines as subtrees
        let mut tree_depth = 0;
        for fragment in self.fragments() {
            match fragment.tree.locate_below(segments.as_slice(), tree_depth) {
                PathLookup::Found(value) => return Some((value, &fragment.source)),
                PathLookup::Shadowed => return None,
                PathLookup::Absent { depth } => tree_depth = tree_depth.max(depth),
            }
        }
        None
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    /// Materialise the merged document.
    ///
    /// Trees are merged key by key and lists are taken whole from the highest
    /// priority fragment defining them. Every leaf path reads the same here
    /// as through [`resolve`](Self::resolve); a subtree resolved directly
    /// holds only the winning fragment's keys.
    pub fn materialize(&self) -> ConfigTree {
        let ordered: Vec<&Fragment> = self.fragments().collect();
        deep_merge_all(ordered.into_iter().rev().map(|fragment| fragment.tree.clone()))
    }

    /// The merged document as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        self.materialize().to_json()
    }
}
