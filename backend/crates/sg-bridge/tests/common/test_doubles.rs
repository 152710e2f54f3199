use sg_bridge::{DownstreamError, DownstreamValidator, ValidationOutcome};
use sg_core::{Identity, IdentityKey, UserRecord, WebhookEvent};
use sg_store::{
    EventEffect, EventMutation, MemoryStore, Result as StoreResult, ShadowStore, StoreError,
    Upserted,
};

use std::panic::Location;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_location::ErrorLocation;

#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    Accept,
    Reject(u16),
    Fail(u16),
    Hang,
}

/// Validator answering from a fixed script and counting invocations.
pub struct ScriptedValidator {
    answer: Mutex<Scripted>,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    pub fn new(answer: Scripted) -> Self {
        Self {
            answer: Mutex::new(answer),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, answer: Scripted) {
        *self.answer.lock().unwrap() = answer;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownstreamValidator for ScriptedValidator {
    async fn validate(&self, _record: &UserRecord) -> Result<ValidationOutcome, DownstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = *self.answer.lock().unwrap();
        match answer {
            Scripted::Accept => Ok(ValidationOutcome::Accepted),
            Scripted::Reject(status) => Ok(ValidationOutcome::Rejected { status }),
            Scripted::Fail(status) => Err(DownstreamError::Status {
                status,
                location: ErrorLocation::from(Location::caller()),
            }),
            Scripted::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(ValidationOutcome::Accepted)
            }
        }
    }
}

/// Store whose every operation fails as if the database were gone.
pub struct UnavailableStore;

fn unavailable() -> StoreError {
    StoreError::Initialization {
        message: "database is locked".to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[async_trait]
impl ShadowStore for UnavailableStore {
    async fn get(&self, _key: &IdentityKey) -> StoreResult<UserRecord> {
        Err(unavailable())
    }

    async fn upsert(&self, _identity: &Identity) -> StoreResult<Upserted> {
        Err(unavailable())
    }

    async fn list(&self) -> StoreResult<Vec<UserRecord>> {
        Err(unavailable())
    }

    async fn delete(&self, _key: &IdentityKey, _at: DateTime<Utc>) -> StoreResult<()> {
        Err(unavailable())
    }

    async fn apply_event(
        &self,
        _event: &WebhookEvent,
        _mutation: EventMutation,
    ) -> StoreResult<EventEffect> {
        Err(unavailable())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(unavailable())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Memory store whose event writes hang until [`StallingStore::recover`].
pub struct StallingStore {
    inner: MemoryStore,
    stalled: AtomicBool,
}

impl StallingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(true),
            stalled: AtomicBool::new(true),
        }
    }

    pub fn recover(&self) {
        self.stalled.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl ShadowStore for StallingStore {
    async fn get(&self, key: &IdentityKey) -> StoreResult<UserRecord> {
        self.inner.get(key).await
    }

    async fn upsert(&self, identity: &Identity) -> StoreResult<Upserted> {
        self.inner.upsert(identity).await
    }

    async fn list(&self) -> StoreResult<Vec<UserRecord>> {
        self.inner.list().await
    }

    async fn delete(&self, key: &IdentityKey, at: DateTime<Utc>) -> StoreResult<()> {
        self.inner.delete(key, at).await
    }

    async fn apply_event(
        &self,
        event: &WebhookEvent,
        mutation: EventMutation,
    ) -> StoreResult<EventEffect> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.apply_event(event, mutation).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "stalling"
    }
}
