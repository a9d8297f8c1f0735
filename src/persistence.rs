//! Typed options for the SQL journal and snapshot-store plugins.
//!
//! Options render into configuration fragments under the plugin path
//! (`akka.persistence.journal.<id>` or `akka.persistence.snapshot-store.<id>`).
//! Plugin defaults are rendered separately and installed as the overlay floor,
//! so anything an option or a user document sets wins over them.

use crate::config::{
    ConfigOverlay, ConfigRead, ConfigTree, ConfigValue, DOT_DELIMITER, Fragment, FragmentSource,
    canonical_segment, deep_merge_all, expand,
};
use crate::error::{ConfigError, ConfigResult};
use tracing::debug;

/// Default plugin identifier.
pub const DEFAULT_IDENTIFIER: &str = "sql";

/// Which persistence plugin an options value configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Journal,
    Snapshot,
}

impl PluginKind {
    /// Root under which plugins of this kind are declared.
    pub fn root(&self) -> &'static str {
        match self {
            PluginKind::Journal => "akka.persistence.journal",
            PluginKind::Snapshot => "akka.persistence.snapshot-store",
        }
    }

    /// Full path of the plugin with the given identifier.
    pub fn plugin_path(&self, identifier: &str) -> String {
        format!("{}.{}", self.root(), identifier)
    }

    /// Key that selects the default plugin of this kind.
    pub fn default_plugin_key(&self) -> String {
        format!("{}.plugin", self.root())
    }

    pub fn default_table_name(&self) -> &'static str {
        match self {
            PluginKind::Journal => "journal",
            PluginKind::Snapshot => "snapshot",
        }
    }

    pub fn plugin_class(&self) -> &'static str {
        match self {
            PluginKind::Journal => "Akka.Persistence.Sql.Journal.SqlWriteJournal, Akka.Persistence.Sql",
            PluginKind::Snapshot => {
                "Akka.Persistence.Sql.Snapshot.SqlSnapshotStore, Akka.Persistence.Sql"
            }
        }
    }
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginKind::Journal => write!(f, "journal"),
            PluginKind::Snapshot => write!(f, "snapshot-store"),
        }
    }
}

/// Options for one SQL persistence plugin.
///
/// Immutable; every `with_*` method returns an updated copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPersistenceOptions {
    kind: PluginKind,
    identifier: String,
    connection_string: String,
    provider_name: String,
    schema_name: Option<String>,
    table_name: String,
    auto_initialize: bool,
    is_default_plugin: bool,
    serializer: Option<String>,
}

impl SqlPersistenceOptions {
    pub fn new(
        kind: PluginKind,
        connection_string: impl Into<String>,
        provider_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            identifier: DEFAULT_IDENTIFIER.to_string(),
            connection_string: connection_string.into(),
            provider_name: provider_name.into(),
            schema_name: None,
            table_name: kind.default_table_name().to_string(),
            auto_initialize: false,
            is_default_plugin: true,
            serializer: None,
        }
    }

    pub fn journal(connection_string: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self::new(PluginKind::Journal, connection_string, provider_name)
    }

    pub fn snapshot(connection_string: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self::new(PluginKind::Snapshot, connection_string, provider_name)
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn with_auto_initialize(mut self, auto_initialize: bool) -> Self {
        self.auto_initialize = auto_initialize;
        self
    }

    pub fn with_default_plugin(mut self, is_default_plugin: bool) -> Self {
        self.is_default_plugin = is_default_plugin;
        self
    }

    pub fn with_serializer(mut self, serializer: impl Into<String>) -> Self {
        self.serializer = Some(serializer.into());
        self
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.schema_name.as_deref()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn auto_initialize(&self) -> bool {
        self.auto_initialize
    }

    pub fn is_default_plugin(&self) -> bool {
        self.is_default_plugin
    }

    pub fn serializer(&self) -> Option<&str> {
        self.serializer.as_deref()
    }

    pub fn plugin_path(&self) -> String {
        self.kind.plugin_path(&self.identifier)
    }

    /// Render these options as a fragment.
    pub fn to_fragment(&self) -> ConfigResult<Fragment> {
        validate_identifier(&self.identifier)?;
        let plugin = self.plugin_path();
        let key = |name: &str| format!("{}.{}", plugin, name);

        let mut pairs: Vec<(String, ConfigValue)> = vec![
            (key("connection-string"), self.connection_string.clone().into()),
            (key("provider-name"), self.provider_name.clone().into()),
            (key("table-name"), self.table_name.clone().into()),
            (key("auto-initialize"), self.auto_initialize.into()),
        ];
        if let Some(schema) = &self.schema_name {
            pairs.push((key("schema-name"), schema.clone().into()));
        }
        if let Some(serializer) = &self.serializer {
            pairs.push((key("serializer"), serializer.clone().into()));
        }
        if self.is_default_plugin {
            pairs.push((self.kind.default_plugin_key(), plugin.clone().into()));
        }

        let tree = expand(pairs, DOT_DELIMITER)?;
        Ok(Fragment::new(FragmentSource::Options(plugin), tree))
    }

    /// Read options for `kind`/`identifier` back from layered configuration.
    ///
    /// Connection string and provider name are required; the rest fall back
    /// to the built-in defaults when absent.
    pub fn from_config<R: ConfigRead + ?Sized>(
        reader: &R,
        kind: PluginKind,
        identifier: &str,
    ) -> ConfigResult<Self> {
        validate_identifier(identifier)?;
        let plugin = reader.get_config(&kind.plugin_path(identifier))?;

        let optional_string = |name: &str| match plugin.get_string(name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        };
        let auto_initialize = match plugin.get_bool("auto-initialize") {
            Ok(value) => value,
            Err(e) if e.is_missing() => false,
            Err(e) => return Err(e),
        };
        let is_default_plugin = match reader.get_string(&kind.default_plugin_key()) {
            Ok(selected) => selected == kind.plugin_path(identifier),
            Err(e) if e.is_missing() => false,
            Err(e) => return Err(e),
        };

        Ok(Self {
            kind,
            identifier: identifier.to_string(),
            connection_string: plugin.get_string("connection-string")?,
            provider_name: plugin.get_string("provider-name")?,
            schema_name: optional_string("schema-name")?,
            table_name: optional_string("table-name")?
                .unwrap_or_else(|| kind.default_table_name().to_string()),
            auto_initialize,
            is_default_plugin,
            serializer: optional_string("serializer")?,
        })
    }
}

fn validate_identifier(identifier: &str) -> ConfigResult<()> {
    if identifier.is_empty() || identifier.contains('.') {
        return Err(ConfigError::malformed_key(
            identifier,
            "plugin identifier must be a single non-empty segment",
        ));
    }
    // Keys are canonicalised on expansion; a non-canonical id could never be looked up again
    if canonical_segment(identifier) != identifier {
        return Err(ConfigError::malformed_key(
            identifier,
            format!("plugin identifier must be kebab-case ('{}')", canonical_segment(identifier)),
        ));
    }
    Ok(())
}

/// Built-in defaults for one plugin, used as (part of) the floor fragment.
pub fn default_tree(kind: PluginKind, identifier: &str) -> ConfigResult<ConfigTree> {
    validate_identifier(identifier)?;
    let plugin = kind.plugin_path(identifier);
    let key = |name: &str| format!("{}.{}", plugin, name);
    let pairs: Vec<(String, ConfigValue)> = vec![
        (key("class"), kind.plugin_class().into()),
        (key("plugin-dispatcher"), "akka.actor.default-dispatcher".into()),
        (key("connection-string"), "".into()),
        (key("provider-name"), "".into()),
        (key("table-name"), kind.default_table_name().into()),
        (key("auto-initialize"), false.into()),
    ];
    expand(pairs, DOT_DELIMITER)
}

/// Assembles an overlay from persistence options.
///
/// Resolution order, highest first: extra fragments (last added first),
/// option fragments, plugin defaults (floor).
#[derive(Debug, Clone, Default)]
pub struct PersistenceSetup {
    options: Vec<SqlPersistenceOptions>,
    fragments: Vec<Fragment>,
}

impl PersistenceSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a journal or snapshot-store plugin; later plugins rank higher.
    pub fn with_plugin(mut self, options: SqlPersistenceOptions) -> Self {
        self.options.push(options);
        self
    }

    /// Add a fragment that ranks above every option fragment.
    pub fn with_fragment(mut self, fragment: impl Into<Fragment>) -> Self {
        self.fragments.push(fragment.into());
        self
    }

    /// Merged defaults for every configured plugin.
    pub fn defaults(&self) -> ConfigResult<ConfigTree> {
        let trees = self
            .options
            .iter()
            .map(|options| default_tree(options.kind(), options.identifier()))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(deep_merge_all(trees))
    }

    /// Prepend option fragments, then extra fragments, onto `overlay`.
    ///
    /// The overlay's floor is left untouched.
    pub fn apply_to(&self, overlay: &mut ConfigOverlay) -> ConfigResult<()> {
        // Render everything first so a bad option leaves the overlay unchanged
        let rendered = self
            .options
            .iter()
            .map(SqlPersistenceOptions::to_fragment)
            .collect::<ConfigResult<Vec<_>>>()?;
        for fragment in rendered {
            overlay.prepend(fragment);
        }
        for fragment in &self.fragments {
            overlay.prepend(fragment.clone());
        }
        debug!(
            plugins = self.options.len(),
            extra = self.fragments.len(),
            "Applied persistence configuration"
        );
        Ok(())
    }

    /// Build a fresh overlay with plugin defaults as the floor.
    pub fn build(&self) -> ConfigResult<ConfigOverlay> {
        let mut overlay = ConfigOverlay::new();
        overlay.append_floor(Fragment::new(FragmentSource::Defaults, self.defaults()?));
        self.apply_to(&mut overlay)?;
        Ok(overlay)
    }
}
