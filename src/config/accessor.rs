//! Typed reads over an overlay.
//!
//! Coercion rules:
//! - **string**: text, numbers and booleans render as text
//! - **integer**: integral numbers, or base-10 text
//! - **boolean**: `on|true|yes` and `off|false|no`, case-insensitive
//! - **duration**: `<magnitude><unit>` with unit in `ms, s, m, h, d`
//! - **string list**: a list of scalars
//!
//! An absent path is always a [`ConfigError::MissingKey`]; nothing is
//! silently defaulted. Query paths may use any casing: each segment is
//! canonicalised before lookup, just like keys on expansion.

use super::overlay::ConfigOverlay;
use super::value::{ConfigValue, PATH_SEPARATOR};
use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Typed getters over anything backed by a [`ConfigOverlay`].
///
/// Implementors supply the overlay and, for scoped views, the path prefix;
/// every getter is provided on top of that.
pub trait ConfigRead {
    /// The overlay lookups go through.
    fn overlay(&self) -> &ConfigOverlay;

    /// Path prefix applied to every lookup.
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Absolute path for a path relative to this reader.
    fn full_path(&self, path: &str) -> String {
        match self.prefix() {
            Some(prefix) if !path.is_empty() => format!("{}{}{}", prefix, PATH_SEPARATOR, path),
            Some(prefix) => prefix.to_string(),
            None => path.to_string(),
        }
    }

    /// Raw lookup; `None` when no fragment defines the path.
    fn lookup(&self, path: &str) -> Option<&ConfigValue> {
        self.overlay().resolve(&self.full_path(path))
    }

    fn has_path(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// The resolved value, or [`ConfigError::MissingKey`].
    fn get_value(&self, path: &str) -> ConfigResult<&ConfigValue> {
        self.lookup(path)
            .ok_or_else(|| ConfigError::missing_key(self.full_path(path)))
    }

    fn get_string(&self, path: &str) -> ConfigResult<String> {
        let value = self.get_value(path)?;
        value.as_text().ok_or_else(|| {
            ConfigError::type_mismatch(&self.full_path(path), "string", value.kind_name())
        })
    }

    fn get_int(&self, path: &str) -> ConfigResult<i64> {
        let full = self.full_path(path);
        match self.get_value(path)? {
            ConfigValue::Number(n) => n
                .as_i64()
                .ok_or_else(|| ConfigError::format(&full, "integer", n.to_string())),
            ConfigValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::format(&full, "integer", s.as_str())),
            ConfigValue::Boolean(b) => Err(ConfigError::format(&full, "integer", b.to_string())),
            other => Err(ConfigError::type_mismatch(&full, "integer", other.kind_name())),
        }
    }

    fn get_bool(&self, path: &str) -> ConfigResult<bool> {
        let full = self.full_path(path);
        match self.get_value(path)? {
            ConfigValue::Boolean(b) => Ok(*b),
            ConfigValue::String(s) => {
                parse_bool(s).ok_or_else(|| ConfigError::format(&full, "boolean", s.as_str()))
            }
            ConfigValue::Number(n) => Err(ConfigError::format(&full, "boolean", n.to_string())),
            other => Err(ConfigError::type_mismatch(&full, "boolean", other.kind_name())),
        }
    }

    fn get_duration(&self, path: &str) -> ConfigResult<Duration> {
        let full = self.full_path(path);
        match self.get_value(path)? {
            ConfigValue::String(s) => {
                parse_duration(s).ok_or_else(|| ConfigError::format(&full, "duration", s.as_str()))
            }
            // A bare number carries no unit
            ConfigValue::Number(n) => Err(ConfigError::format(&full, "duration", n.to_string())),
            ConfigValue::Boolean(b) => Err(ConfigError::format(&full, "duration", b.to_string())),
            other => Err(ConfigError::type_mismatch(&full, "duration", other.kind_name())),
        }
    }

    fn get_string_list(&self, path: &str) -> ConfigResult<Vec<String>> {
        let full = self.full_path(path);
        let value = self.get_value(path)?;
        let items = value
            .as_list()
            .ok_or_else(|| ConfigError::type_mismatch(&full, "list", value.kind_name()))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_text().ok_or_else(|| {
                    ConfigError::type_mismatch(
                        &format!("{}{}{}", full, PATH_SEPARATOR, index),
                        "string",
                        item.kind_name(),
                    )
                })
            })
            .collect()
    }

    /// A read-only view scoped to the subtree at `path`.
    ///
    /// Lookups through the view are prefixed with `path` and still resolve
    /// through every fragment of the overlay.
    fn get_config(&self, path: &str) -> ConfigResult<ConfigView<'_>> {
        let full = self.full_path(path);
        match self.get_value(path)? {
            ConfigValue::Tree(_) => Ok(ConfigView::new(self.overlay(), full)),
            other => Err(ConfigError::type_mismatch(&full, "tree", other.kind_name())),
        }
    }
}

impl ConfigRead for ConfigOverlay {
    fn overlay(&self) -> &ConfigOverlay {
        self
    }
}

/// Read-only view of an overlay rooted at a path.
#[derive(Debug, Clone)]
pub struct ConfigView<'a> {
    overlay: &'a ConfigOverlay,
    path: String,
}

impl<'a> ConfigView<'a> {
    fn new(overlay: &'a ConfigOverlay, path: String) -> Self {
        Self { overlay, path }
    }

    /// Absolute path of the subtree this view is rooted at.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ConfigRead for ConfigView<'_> {
    fn overlay(&self) -> &ConfigOverlay {
        self.overlay
    }

    fn prefix(&self) -> Option<&str> {
        Some(&self.path)
    }
}

/// Parse the boolean vocabulary shared with the persistence dialect.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Parse `<magnitude><unit>`, e.g. `2s`, `150ms`, `1.5h`.
///
/// The magnitude is an unsigned integer or decimal with no space before the
/// unit. Returns `None` for anything else, including a missing unit.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let split = text.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
    let (magnitude, unit) = text.split_at(split);
    if magnitude.is_empty() {
        return None;
    }
    let unit_millis: u64 = match unit {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => return None,
    };

    if let Ok(whole) = magnitude.parse::<u64>() {
        return whole.checked_mul(unit_millis).map(Duration::from_millis);
    }
    let fractional: f64 = magnitude.parse().ok()?;
    Duration::try_from_secs_f64(fractional * unit_millis as f64 / 1_000.0).ok()
}
