//! Structured error types for configuration ingestion and typed reads.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Ingestion errors
    MalformedKey,
    Parse,

    // Read errors
    MissingKey,
    TypeMismatch,
    Format,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::MalformedKey => "malformed key",
            ErrorKind::Parse => "parse",
            ErrorKind::MissingKey => "missing key",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Format => "format",
        };
        f.write_str(s)
    }
}

/// Errors raised while expanding sources into fragments or reading typed values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A key cannot be placed in the tree (leaf/branch conflict, empty segment, duplicate).
    #[error("malformed key '{key}': {reason}")]
    MalformedKey { key: String, reason: String },

    /// The path is not defined by any fragment.
    #[error("missing configuration key '{path}'")]
    MissingKey { path: String },

    /// The path resolved to a value of the wrong structural kind.
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The leaf exists but does not follow the grammar of the requested type.
    #[error("invalid {expected} at '{path}': {value:?}")]
    Format {
        path: String,
        expected: &'static str,
        value: String,
    },

    /// A source document could not be parsed.
    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub fn malformed_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_key(path: impl Into<String>) -> Self {
        Self::MissingKey { path: path.into() }
    }

    pub fn type_mismatch(path: &str, expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected,
            found,
        }
    }

    pub fn format(path: &str, expected: &'static str, value: impl Into<String>) -> Self {
        Self::Format {
            path: path.to_string(),
            expected,
            value: value.into(),
        }
    }

    pub fn parse(format: &'static str, err: impl fmt::Display) -> Self {
        Self::Parse {
            format,
            message: err.to_string(),
        }
    }

    /// The error code of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::MalformedKey { .. } => ErrorKind::MalformedKey,
            ConfigError::MissingKey { .. } => ErrorKind::MissingKey,
            ConfigError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ConfigError::Format { .. } => ErrorKind::Format,
            ConfigError::Parse { .. } => ErrorKind::Parse,
        }
    }

    /// True when the path was not defined anywhere.
    ///
    /// Callers that want a default for absent keys match on this instead of
    /// swallowing every error.
    pub fn is_missing(&self) -> bool {
        self.kind() == ErrorKind::MissingKey
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
