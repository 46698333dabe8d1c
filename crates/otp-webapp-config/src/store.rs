//! Process-wide holder for the resolved web client config.
//!
//! A store accepts loads until a consumer first reads it; after that the
//! published value is frozen for the rest of the process.

use crate::{ConfigError, LayeredConfigOptions, WebappConfig};
use log::{info, warn};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Load/get lifecycle around a single immutable `WebappConfig`.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Option<Arc<WebappConfig>>>,
    published: AtomicBool,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate raw config data, fill defaults, and cache the result.
    ///
    /// Replaces any earlier load (last load wins) until `get()` has been
    /// called once; after that it fails with [`ConfigError::AlreadyPublished`].
    pub fn load(&self, raw: &Value) -> Result<Arc<WebappConfig>, ConfigError> {
        let config = WebappConfig::from_value(raw.clone())?;
        self.install(config)
    }

    /// Validate and cache a config built in code.
    pub fn load_config(&self, config: WebappConfig) -> Result<Arc<WebappConfig>, ConfigError> {
        config.validate()?;
        self.install(config)
    }

    /// Load the layered file stack and cache the effective config.
    pub fn load_layered(
        &self,
        options: LayeredConfigOptions,
    ) -> Result<Arc<WebappConfig>, ConfigError> {
        let layered = WebappConfig::load_layered_with_options(options)?;
        self.install(layered.config)
    }

    /// Return the cached config and freeze it against further loads.
    pub fn get(&self) -> Result<Arc<WebappConfig>, ConfigError> {
        let current = self.current.read();
        let config = current.clone().ok_or(ConfigError::NotLoaded)?;
        if !self.published.swap(true, Ordering::AcqRel) {
            info!("config published to consumers");
        }
        Ok(config)
    }

    /// Whether a consumer has read the config, forbidding re-loads.
    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }

    fn install(&self, config: WebappConfig) -> Result<Arc<WebappConfig>, ConfigError> {
        let mut current = self.current.write();
        if self.published.load(Ordering::Acquire) {
            warn!("refusing config re-load after publish");
            return Err(ConfigError::AlreadyPublished);
        }
        let config = Arc::new(config);
        if current.replace(config.clone()).is_some() {
            info!("config replaced by a later load");
        } else {
            info!("config loaded");
        }
        Ok(config)
    }
}

static GLOBAL: OnceLock<ConfigStore> = OnceLock::new();

/// The process-wide config store.
pub fn global() -> &'static ConfigStore {
    GLOBAL.get_or_init(ConfigStore::new)
}

/// Load raw config data into the process-wide store.
pub fn load(raw: &Value) -> Result<Arc<WebappConfig>, ConfigError> {
    global().load(raw)
}

/// Read the process-wide config.
pub fn get() -> Result<Arc<WebappConfig>, ConfigError> {
    global().get()
}
