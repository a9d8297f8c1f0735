//! Persistence configuration library.
//!
//! Layered configuration (fragments, key-path expansion, typed reads) and
//! typed option builders for SQL journal and snapshot-store plugins.

pub mod config;
pub mod error;
pub mod logging;
pub mod persistence;

pub use config::{ConfigOverlay, ConfigRead, ConfigTree, ConfigValue};
pub use error::{ConfigError, ConfigResult, ErrorKind};
pub use persistence::{PersistenceSetup, PluginKind, SqlPersistenceOptions};
