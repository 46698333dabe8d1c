//! Configuration store for the OpenTripPlanner web client.
//!
//! This crate owns the client config schema (map extents, tile layers, icon
//! and unit preferences, context menu toggles), its defaults and validation,
//! and the process-wide store other components read the resolved config from.
//!
//! ```
//! use otp_webapp_config::{ConfigStore, MetricsSystem};
//! use serde_json::json;
//!
//! let store = ConfigStore::new();
//! store.load(&json!({ "metricsSystem": "international" })).unwrap();
//! let config = store.get().unwrap();
//! assert_eq!(config.metrics_system, MetricsSystem::International);
//! assert_eq!(config.map.options.num_zoom_levels, 17);
//! ```

mod error;
mod loader;
mod model;
mod store;

/// Public error types returned by config loading, validation and access.
pub use error::{ConfigError, SchemaError, SchemaErrorKind};
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
/// Config store and the process-wide accessors.
pub use store::{ConfigStore, get, global, load};
