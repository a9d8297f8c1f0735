//! Layered configuration.
//!
//! Fragments from several sources are stacked on an overlay and read back
//! through typed accessors:
//! 1. **Defaults** - the floor fragment, always lowest
//! 2. **Project** - `$CWD/persistence-config/config.{yaml,json}`
//! 3. **User** - `~/.persistence-config/config.{yaml,json}`
//! 4. **Environment** - variables under a prefix, `__` as segment delimiter
//!
//! ## Resolution
//! - The first fragment that defines a path wins, leaf or subtree
//! - Lists are never merged across fragments
//! - Scoped views ([`ConfigView`]) keep overlay precedence for nested paths
//!
//! ## Environment Variables
//! - `PERSISTENCE_CONFIG_PATH` - Explicit config file (replaces project and user tiers)
//! - `PERSISTENCE_CONFIG_USER_DIR` - User config dir (default: `~/.persistence-config`)
//! - `PERSISTENCE_CONFIG_PROJECT_DIR` - Project config dir (default: `./persistence-config`)

mod accessor;
mod keys;
mod loader;
mod merge;
mod overlay;
mod sources;
mod value;

pub use accessor::{ConfigRead, ConfigView, parse_bool, parse_duration};
pub use keys::{DOT_DELIMITER, ENV_DELIMITER, canonical_segment, expand, flatten, split_key};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader, ConfigPaths, ConfigTier, read_document};
pub use merge::{deep_merge, deep_merge_all, merge_trees};
pub use overlay::{ConfigOverlay, Fragment, FragmentSource};
pub use sources::{
    flatten_json, from_env_vars, from_json, from_process_env, parse_json, parse_yaml,
};
pub use value::{ConfigTree, ConfigValue, PATH_SEPARATOR, PathLookup};
