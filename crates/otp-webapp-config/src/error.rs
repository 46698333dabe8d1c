//! Error types for config loading, validation, and access.

use std::fmt;
use thiserror::Error;

/// Errors returned while loading, validating, or reading config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a config file failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// Converting JSON values failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A field violated the config schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// `get()` was called before any successful `load()`.
    #[error("config has not been loaded")]
    NotLoaded,
    /// A re-load was attempted after consumers already read the config.
    #[error("config was already published to consumers; re-load is not permitted")]
    AlreadyPublished,
}

impl ConfigError {
    /// Schema rule that failed, when this is a schema error.
    pub fn schema_kind(&self) -> Option<SchemaErrorKind> {
        match self {
            ConfigError::Schema(err) => Some(err.kind),
            _ => None,
        }
    }
}

/// A schema violation, naming the offending field path and failing rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid config at {path}: {message} ({kind})")]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    /// `<source>:<dotted.field.path>`, e.g. `config:map.options.numZoomLevels`.
    pub path: String,
    pub message: String,
}

impl SchemaError {
    pub(crate) fn new(
        kind: SchemaErrorKind,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build an error for a field inside a labelled config source.
    pub(crate) fn at(kind: SchemaErrorKind, source: &str, path: &str, message: &str) -> Self {
        let normalized_path = if path.is_empty() { "root" } else { path };
        Self::new(kind, format!("{source}:{normalized_path}"), message)
    }
}

/// Rule categories a schema violation can fall under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaErrorKind {
    /// A field required by another field's value is missing or blank.
    MissingDependentField,
    /// An unconditionally required field is blank.
    MissingRequiredField,
    /// A value is outside its closed set of allowed strings.
    InvalidEnumValue,
    /// A numeric or length constraint is violated.
    InvalidRange,
    /// A bounding box is not ordered.
    InvalidBounds,
    /// A value has the wrong JSON type.
    InvalidType,
    /// A key is not part of the schema.
    UnknownKey,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchemaErrorKind::MissingDependentField => "missing dependent field",
            SchemaErrorKind::MissingRequiredField => "missing required field",
            SchemaErrorKind::InvalidEnumValue => "invalid enum value",
            SchemaErrorKind::InvalidRange => "invalid range",
            SchemaErrorKind::InvalidBounds => "invalid bounds",
            SchemaErrorKind::InvalidType => "invalid type",
            SchemaErrorKind::UnknownKey => "unknown key",
        };
        f.write_str(name)
    }
}
