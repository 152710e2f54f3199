use crate::{ConfigError, ConfigErrorResult, DEFAULT_STORE_FILENAME, StoreBackend};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite file, relative to the config directory
    pub path: String,
    /// Refuse to start with a non-durable backend
    pub require_durable: bool,
    /// Operator has accepted that the memory backend loses data on restart
    pub acknowledge_ephemeral: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            path: String::from(DEFAULT_STORE_FILENAME),
            require_durable: false,
            acknowledge_ephemeral: false,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.require_durable && !self.backend.is_durable() {
            return Err(ConfigError::store(format!(
                "store.require_durable is set but store.backend is '{}'; \
                 shadow users would be lost on restart",
                self.backend
            )));
        }

        if self.backend == StoreBackend::Sqlite {
            if self.path.trim().is_empty() {
                return Err(ConfigError::store("store.path cannot be empty"));
            }

            let path = std::path::Path::new(&self.path);
            if path.is_absolute() || self.path.contains("..") {
                return Err(ConfigError::store(
                    "store.path must be relative and cannot contain '..'",
                ));
            }
        }

        Ok(())
    }
}
