use crate::error::Result as ServerErrorResult;

use sg_config::{Config, ConfigError, StoreBackend};
use sg_store::{MemoryStore, ShadowStore, SqliteStore};

use std::sync::Arc;

use log::info;

/// Open the backend named in configuration.
///
/// Selection happens once, here. A SQLite failure is fatal; there is no
/// fallback to memory.
pub async fn open_store(config: &Config) -> ServerErrorResult<Arc<dyn ShadowStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            if config.store.require_durable {
                return Err(ConfigError::store(
                    "store.require_durable is set but store.backend is \"memory\"",
                )
                .into());
            }
            Ok(Arc::new(MemoryStore::new(config.store.acknowledge_ephemeral)))
        }
        StoreBackend::Sqlite => {
            let path = config.store_path()?;
            info!("Opening shadow store: {}", path.display());
            let store = SqliteStore::open(&path).await?;
            Ok(Arc::new(store))
        }
    }
}
