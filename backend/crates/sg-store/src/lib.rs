pub mod error;
pub mod memory_store;
pub mod shadow_store;
pub mod sqlite_store;

pub use error::{Result, StoreError};
pub use memory_store::MemoryStore;
pub use shadow_store::{EventEffect, EventMutation, ShadowStore, Upserted};
pub use sqlite_store::SqliteStore;
