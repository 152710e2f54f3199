use sg_store::{MemoryStore, ShadowStore, SqliteStore};

use std::sync::Arc;

use tempfile::TempDir;

pub async fn create_sqlite_store(dir: &TempDir) -> SqliteStore {
    SqliteStore::open(&dir.path().join("shadow.db"))
        .await
        .expect("Failed to open sqlite store")
}

/// One instance of every backend, for behaviour both must share.
pub async fn all_backends(dir: &TempDir) -> Vec<Arc<dyn ShadowStore>> {
    vec![
        Arc::new(MemoryStore::new(true)),
        Arc::new(create_sqlite_store(dir).await),
    ]
}
