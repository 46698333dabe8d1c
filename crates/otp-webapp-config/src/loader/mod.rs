//! Config loading pipeline: schema check, defaulting, and typed validation.
//!
//! A raw nested value is checked structurally, decoded with serde (which
//! fills in defaults for absent fields), then validated for cross-field
//! rules. Layered loads merge several JSON5 sources before running the same
//! pipeline on the merged value.

mod merge;
mod schema;

#[cfg(test)]
mod tests;

use crate::{ConfigError, SchemaError, SchemaErrorKind, WebappConfig};
use directories::UserDirs;
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config filename in the system and user layers.
const DEFAULT_CONFIG_FILE: &str = "config.json5";
/// Default config directory under the user's home.
const DEFAULT_CONFIG_DIR: &str = ".otp-webapp";
/// Config filename looked up in the working directory.
const CWD_CONFIG_FILE: &str = "otp-webapp.json5";

#[cfg(unix)]
/// Default system config path on Unix.
const SYSTEM_CONFIG_PATH: &str = "/etc/otp-webapp/config.json5";

/// Label used in error paths for single-source loads.
const SINGLE_SOURCE_LABEL: &str = "config";
/// Label used in error paths for the merged result of a layered load.
const EFFECTIVE_LABEL: &str = "effective";

/// Effective config plus metadata about which layers were loaded.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// The merged, validated config.
    pub config: WebappConfig,
    /// Metadata for each layer that contributed, lowest precedence first.
    pub layers: Vec<ConfigLayer>,
}

/// Origin for a single config layer in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// System-wide configuration.
    System,
    /// User-specific configuration.
    User,
    /// Working directory configuration.
    Cwd,
    /// Runtime overrides (highest precedence).
    Runtime,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    /// Location on disk if present.
    pub path: Option<PathBuf>,
}

/// Options controlling layered config discovery and overrides.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Working directory searched for `otp-webapp.json5`.
    pub cwd: PathBuf,
    /// Optional system config path (defaults to `/etc/otp-webapp/config.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// Optional user config path (defaults to `~/.otp-webapp/config.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Runtime override config paths applied last; each must exist.
    pub runtime_paths: Vec<PathBuf>,
}

impl ConfigLayerSource {
    /// Label used as the source prefix in schema error paths.
    fn label(self, path: &Path) -> String {
        let name = match self {
            ConfigLayerSource::System => "system",
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        };
        format!("{name}({})", path.display())
    }

    /// Runtime overrides were asked for explicitly and must exist.
    fn is_required(self) -> bool {
        matches!(self, ConfigLayerSource::Runtime)
    }
}

impl LayeredConfigOptions {
    /// Create options with default layer locations for the provided cwd.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: default_system_config_path(),
            user_config_path: UserDirs::new().map(|dirs| {
                dirs.home_dir()
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILE)
            }),
            runtime_paths: Vec::new(),
        }
    }

    /// Add a runtime override config path that is applied last.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl WebappConfig {
    /// Load from an already-parsed raw value, applying defaults and validation.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        config_from_value(value, SINGLE_SOURCE_LABEL)
    }

    /// Serialize back to the raw nested (camelCase) structure.
    pub fn to_value(&self) -> Result<Value, ConfigError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Load a single config from a JSON5 file (no layering).
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, SINGLE_SOURCE_LABEL)
    }

    /// Load a single config from JSON5 contents (no layering).
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, SINGLE_SOURCE_LABEL)
    }

    /// Load a layered config stack using the default layer locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        info!(
            "loading layered config with defaults (cwd={})",
            cwd.as_ref().display()
        );
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load a layered config stack using explicit layer locations and overrides.
    ///
    /// Layer precedence (low -> high): system, user, cwd, runtime overrides.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = layer_key(&options.cwd);
        debug!("resolved cwd for config load: {}", cwd.display());

        let mut candidates = vec![
            (ConfigLayerSource::System, options.system_config_path),
            (ConfigLayerSource::User, options.user_config_path),
            (ConfigLayerSource::Cwd, Some(cwd.join(CWD_CONFIG_FILE))),
        ];
        candidates.extend(
            options
                .runtime_paths
                .into_iter()
                .map(|path| (ConfigLayerSource::Runtime, Some(path))),
        );

        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());
        let mut seen_paths = HashSet::new();

        for (source, path) in candidates {
            let Some(path) = path else {
                continue;
            };
            if !source.is_required() && !path.exists() {
                debug!(
                    "optional layer missing (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            if !seen_paths.insert(layer_key(&path)) {
                debug!(
                    "skipping duplicate layer (source={:?}, path={})",
                    source,
                    path.display()
                );
                continue;
            }
            let value = read_layer(source, &path)?;
            merge::merge_json_values(&mut merged, &value);
            layers.push(ConfigLayer {
                source,
                path: Some(path),
            });
        }

        let config = config_from_value(merged, EFFECTIVE_LABEL)?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_as(SINGLE_SOURCE_LABEL)?;
        Ok(())
    }

    fn validate_as(&self, label: &str) -> Result<(), SchemaError> {
        if self.system_map.enabled {
            let dependents = [
                ("layerUrlRoutes", &self.system_map.layer_url_routes),
                ("layerUrlStops", &self.system_map.layer_url_stops),
                ("layerNamesRoute", &self.system_map.layer_names_route),
                ("layerNamesStop", &self.system_map.layer_names_stop),
                ("controlStopsUrl", &self.system_map.control_stops_url),
            ];
            for (key, value) in dependents {
                if is_blank(value.as_deref()) {
                    return Err(SchemaError::at(
                        SchemaErrorKind::MissingDependentField,
                        label,
                        &schema::join_path("systemMap", key),
                        "required when systemMap.enabled is true",
                    ));
                }
            }
        }

        if let Some(bounds) = self.map.default_extent.bounds() {
            if !bounds.is_ordered() {
                return Err(SchemaError::at(
                    SchemaErrorKind::InvalidBounds,
                    label,
                    "map.defaultExtent",
                    "expected minX < maxX and minY < maxY",
                ));
            }
        }

        let options = &self.map.options;
        if is_blank(Some(options.projection.as_str())) {
            return Err(required(label, "map.options.projection"));
        }
        if options.num_zoom_levels == 0 {
            return Err(SchemaError::at(
                SchemaErrorKind::InvalidRange,
                label,
                "map.options.numZoomLevels",
                "expected a positive integer",
            ));
        }

        let base = &self.map.base_layer_options;
        if is_blank(Some(base.url.as_str())) {
            return Err(required(label, "map.baseLayerOptions.url"));
        }
        if base.layers.is_empty() {
            return Err(SchemaError::at(
                SchemaErrorKind::InvalidRange,
                label,
                "map.baseLayerOptions.layers",
                "expected at least one layer",
            ));
        }
        let blank_layer = base
            .layers
            .iter()
            .position(|name| is_blank(Some(name.as_str())));
        if let Some(idx) = blank_layer {
            return Err(required(label, &format!("map.baseLayerOptions.layers[{idx}]")));
        }
        if is_blank(Some(base.format.as_str())) {
            return Err(required(label, "map.baseLayerOptions.format"));
        }

        Ok(())
    }
}

/// Read, parse and structurally check one JSON5 layer.
///
/// Cross-field rules wait for the merged value, since a dependent field may
/// come from another layer.
fn read_layer(source: ConfigLayerSource, path: &Path) -> Result<Value, ConfigError> {
    debug!(
        "loading config layer (source={:?}, path={})",
        source,
        path.display()
    );
    let contents = fs::read_to_string(path)?;
    let value: Value = json5::from_str(&contents)?;
    schema::validate_layer_schema(&value, &source.label(path))?;
    Ok(value)
}

#[cfg(unix)]
fn default_system_config_path() -> Option<PathBuf> {
    Some(PathBuf::from(SYSTEM_CONFIG_PATH))
}

#[cfg(not(unix))]
fn default_system_config_path() -> Option<PathBuf> {
    None
}

fn config_from_value(value: Value, label: &str) -> Result<WebappConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: WebappConfig = serde_json::from_value(value)?;
    config.validate_as(label)?;
    Ok(config)
}

/// Canonical form of a layer path so each file is merged at most once.
fn layer_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|value| value.trim().is_empty())
}

fn required(label: &str, path: &str) -> SchemaError {
    SchemaError::at(
        SchemaErrorKind::MissingRequiredField,
        label,
        path,
        "must not be blank",
    )
}
