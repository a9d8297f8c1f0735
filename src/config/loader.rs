//! Configuration loader with tier-based layering.
//!
//! Loads configuration documents from each tier and stacks them on an
//! overlay, defaults as the floor and environment on top.

use super::overlay::{ConfigOverlay, Fragment, FragmentSource};
use super::sources::{from_process_env, parse_json, parse_yaml};
use super::value::ConfigTree;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File names probed in each configuration directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["config.yaml", "config.yml", "config.json"];

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/persistence-config/)
    Project = 1,
    /// User-level config (~/.persistence-config/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Paths for each configuration tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Explicit config file; when set, the project and user tiers are skipped
    pub explicit_file: Option<PathBuf>,
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        // Explicit file: PERSISTENCE_CONFIG_PATH
        let explicit_file = std::env::var("PERSISTENCE_CONFIG_PATH")
            .ok()
            .map(PathBuf::from);

        // User dir: PERSISTENCE_CONFIG_USER_DIR or ~/.persistence-config
        let user_dir = std::env::var("PERSISTENCE_CONFIG_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".persistence-config")));

        // Project dir: PERSISTENCE_CONFIG_PROJECT_DIR or $CWD/persistence-config
        let project_dir = std::env::var("PERSISTENCE_CONFIG_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("persistence-config")));

        Self {
            explicit_file,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit_file: None,
            project_dir,
            user_dir,
        }
    }

    /// Create paths that load a single explicit file.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit_file: Some(path.into()),
            project_dir: None,
            user_dir: None,
        }
    }

    /// First config file found in `dir`, if any.
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// Configuration loader that handles tier-based layering.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Layered configuration
    overlay: ConfigOverlay,
    /// Files that contributed a fragment, in load order
    loaded_files: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers, reading environment variables
    /// that start with `env_prefix`.
    pub fn load(defaults: ConfigTree, env_prefix: &str) -> Result<Self> {
        let environment = from_process_env(env_prefix)
            .context("Failed to read configuration from environment variables")?;
        Self::load_with_paths(ConfigPaths::discover(), defaults, environment)
    }

    /// Load configuration with explicit paths and an already expanded
    /// environment tier.
    pub fn load_with_paths(
        paths: ConfigPaths,
        defaults: ConfigTree,
        environment: ConfigTree,
    ) -> Result<Self> {
        let mut overlay = ConfigOverlay::new();
        let mut loaded_files = Vec::new();

        // Tier 1: Defaults (floor)
        overlay.append_floor(Fragment::new(FragmentSource::Defaults, defaults));

        if let Some(explicit) = &paths.explicit_file {
            // Explicit path overrides the file tiers and must exist
            let tree = read_document(explicit)?;
            overlay.prepend(Fragment::new(FragmentSource::File(explicit.clone()), tree));
            loaded_files.push((ConfigTier::Project, explicit.clone()));
        } else {
            // Tier 2: Project config, Tier 3: User config
            let tiers = [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ];
            for (tier, dir) in tiers {
                let Some(dir) = dir else { continue };
                match ConfigPaths::find_config_file(dir) {
                    Some(file) => {
                        let tree = read_document(&file)?;
                        overlay.prepend(Fragment::new(FragmentSource::File(file.clone()), tree));
                        loaded_files.push((tier, file));
                    }
                    None => debug!(tier = %tier, dir = %dir.display(), "No config file found"),
                }
            }
        }

        // Tier 4: Environment variables
        if !environment.is_empty() {
            overlay.prepend(Fragment::new(FragmentSource::Environment, environment));
        }

        Ok(Self {
            paths,
            overlay,
            loaded_files,
        })
    }

    /// Get the layered configuration.
    pub fn overlay(&self) -> &ConfigOverlay {
        &self.overlay
    }

    /// Get mutable access to the overlay, e.g. to prepend option fragments.
    pub fn overlay_mut(&mut self) -> &mut ConfigOverlay {
        &mut self.overlay
    }

    /// Consume the loader and return the overlay.
    pub fn into_overlay(self) -> ConfigOverlay {
        self.overlay
    }

    /// Files that were loaded, in load order.
    pub fn loaded_files(&self) -> &[(ConfigTier, PathBuf)] {
        &self.loaded_files
    }
}

/// Read a JSON or YAML document, chosen by file extension.
pub fn read_document(path: &Path) -> Result<ConfigTree> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    let tree = match extension.as_deref() {
        Some("json") => parse_json(&content),
        Some("yaml") | Some("yml") => parse_yaml(&content),
        other => {
            warn!(
                path = %path.display(),
                extension = ?other,
                "Unknown config file extension, parsing as YAML"
            );
            parse_yaml(&content)
        }
    };
    tree.with_context(|| format!("Failed to load config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::accessor::ConfigRead;
    use crate::config::keys::{DOT_DELIMITER, expand};
    use crate::config::sources::from_env_vars;
    use tempfile::TempDir;

    fn defaults() -> ConfigTree {
        expand(
            vec![
                ("akka.loglevel", "INFO"),
                ("akka.persistence.journal.sql.auto-initialize", "off"),
            ],
            DOT_DELIMITER,
        )
        .unwrap()
    }

    #[test]
    fn test_config_paths_discover() {
        let paths = ConfigPaths::discover();
        assert!(paths.project_dir.is_some());
        // user_dir may or may not exist depending on environment
    }

    #[test]
    fn test_load_defaults_only() {
        // Create empty temp dirs so no config files are found
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths, defaults(), ConfigTree::new()).unwrap();
        assert_eq!(loader.overlay().len(), 1);
        assert_eq!(loader.overlay().get_string("akka.loglevel").unwrap(), "INFO");
        assert!(loader.loaded_files().is_empty());
    }

    #[test]
    fn test_project_config_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("persistence-config");
        std::fs::create_dir_all(&project_dir).unwrap();

        let config_content = r#"
akka:
  loglevel: DEBUG
"#;
        std::fs::write(project_dir.join("config.yaml"), config_content).unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(temp.path().join("user")));
        let loader = ConfigLoader::load_with_paths(paths, defaults(), ConfigTree::new()).unwrap();
        let overlay = loader.overlay();

        assert_eq!(overlay.get_string("akka.loglevel").unwrap(), "DEBUG");
        assert!(!overlay.get_bool("akka.persistence.journal.sql.auto-initialize").unwrap());
        assert_eq!(loader.loaded_files()[0].0, ConfigTier::Project);
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("persistence-config");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        let project_config = r#"
akka:
  loglevel: DEBUG
  stdout-loglevel: WARNING
"#;
        std::fs::write(project_dir.join("config.yaml"), project_config).unwrap();
        std::fs::write(
            user_dir.join("config.json"),
            r#"{"akka": {"loglevel": "ERROR"}}"#,
        )
        .unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir));
        let loader = ConfigLoader::load_with_paths(paths, defaults(), ConfigTree::new()).unwrap();
        let overlay = loader.overlay();

        assert_eq!(overlay.get_string("akka.loglevel").unwrap(), "ERROR");
        assert_eq!(overlay.get_string("akka.stdout-loglevel").unwrap(), "WARNING");
        assert_eq!(loader.loaded_files().len(), 2);
    }

    #[test]
    fn test_environment_overrides_files() {
        let temp = TempDir::new().unwrap();
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&user_dir).unwrap();
        std::fs::write(user_dir.join("config.yaml"), "akka:\n  loglevel: ERROR\n").unwrap();

        let environment = from_env_vars(vec![("AKKA__LOGLEVEL", "WARNING")], "akka").unwrap();
        let paths = ConfigPaths::with_dirs(None, Some(user_dir));
        let loader = ConfigLoader::load_with_paths(paths, defaults(), environment).unwrap();

        let (value, source) = loader.overlay().resolve_with_source("akka.loglevel").unwrap();
        assert_eq!(value.as_text().as_deref(), Some("WARNING"));
        assert_eq!(source, &FragmentSource::Environment);
    }

    #[test]
    fn test_explicit_file_skips_tiers() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("custom.json");
        std::fs::write(&file, r#"{"akka": {"loglevel": "OFF"}}"#).unwrap();

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_file(&file), defaults(), ConfigTree::new())
                .unwrap();
        assert_eq!(loader.overlay().get_string("akka.loglevel").unwrap(), "OFF");
        assert_eq!(loader.loaded_files(), &[(ConfigTier::Project, file)]);
    }

    #[test]
    fn test_explicit_file_missing_is_error() {
        let temp = TempDir::new().unwrap();
        let result = ConfigLoader::load_with_paths(
            ConfigPaths::with_file(temp.path().join("absent.yaml")),
            defaults(),
            ConfigTree::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("persistence-config");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.json"), "{ broken").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let err = ConfigLoader::load_with_paths(paths, defaults(), ConfigTree::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("config.json"));
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ConfigTier::Defaults < ConfigTier::Project);
        assert!(ConfigTier::User < ConfigTier::Environment);
        assert_eq!(ConfigTier::Environment.to_string(), "environment");
    }
}
