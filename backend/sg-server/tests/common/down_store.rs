use sg_core::{Identity, IdentityKey, UserRecord, WebhookEvent};
use sg_store::{
    EventEffect, EventMutation, Result as StoreResult, ShadowStore, StoreError, Upserted,
};

use std::panic::Location;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_location::ErrorLocation;

/// Store that fails every call, as an unreachable database would.
pub struct DownStore;

fn down() -> StoreError {
    StoreError::Initialization {
        message: "unable to open database file".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[async_trait]
impl ShadowStore for DownStore {
    async fn get(&self, _key: &IdentityKey) -> StoreResult<UserRecord> {
        Err(down())
    }

    async fn upsert(&self, _identity: &Identity) -> StoreResult<Upserted> {
        Err(down())
    }

    async fn list(&self) -> StoreResult<Vec<UserRecord>> {
        Err(down())
    }

    async fn delete(&self, _key: &IdentityKey, _at: DateTime<Utc>) -> StoreResult<()> {
        Err(down())
    }

    async fn apply_event(
        &self,
        _event: &WebhookEvent,
        _mutation: EventMutation,
    ) -> StoreResult<EventEffect> {
        Err(down())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(down())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
