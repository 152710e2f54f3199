use crate::{Result, StoreError};

use sg_core::{Identity, IdentityKey, MergeOutcome, UserRecord, WebhookEvent};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Record after an upsert and whether the identity changed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    pub record: UserRecord,
    pub outcome: MergeOutcome,
}

/// Store write carried by a webhook event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventMutation {
    Upsert(Identity),
    Delete {
        key: IdentityKey,
        deprovisioned_at: DateTime<Utc>,
    },
}

/// Result of [`ShadowStore::apply_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventEffect {
    /// The event id was already recorded; nothing was written.
    Duplicate,
    Upserted(Upserted),
    Deleted,
    /// A newer deprovision or event for the key is on record.
    Superseded,
    /// Delete of a key with no record. The tombstone is still written.
    NotFound,
}

/// Persistence for shadow users and the webhook idempotency ledger.
///
/// Implementations serialize writes per key and apply the merge rules of
/// [`UserRecord::merge`]; callers never mutate records directly.
#[async_trait]
pub trait ShadowStore: Send + Sync {
    async fn get(&self, key: &IdentityKey) -> Result<UserRecord>;

    /// Create or merge. Fails with `Superseded` when a deprovision newer
    /// than the identity's event time is on record.
    async fn upsert(&self, identity: &Identity) -> Result<Upserted>;

    /// All records ordered by key.
    async fn list(&self) -> Result<Vec<UserRecord>>;

    /// Remove the record and leave a tombstone at `deprovisioned_at`.
    ///
    /// The tombstone is written even when no record exists, in which case
    /// `NotFound` is returned after writing it.
    async fn delete(&self, key: &IdentityKey, deprovisioned_at: DateTime<Utc>) -> Result<()>;

    /// Record `event.event_id` and apply `mutation` as one atomic write.
    ///
    /// An event id already on record yields `Duplicate` without touching
    /// anything. On error, or if the future is dropped, neither the id nor
    /// the mutation is kept. `Superseded` and `NotFound` outcomes do record
    /// the id.
    async fn apply_event(
        &self,
        event: &WebhookEvent,
        mutation: EventMutation,
    ) -> Result<EventEffect>;

    async fn ping(&self) -> Result<()>;

    fn is_durable(&self) -> bool;

    fn backend_name(&self) -> &'static str;
}

/// Fold `identity` into the current state of its key.
///
/// `existing` is the stored record, `tombstone` the last deprovision time
/// for the key. Both backends call this inside their per-key critical
/// section and persist the returned record when the outcome is `Applied`.
pub(crate) fn fold_identity(
    existing: Option<UserRecord>,
    tombstone: Option<DateTime<Utc>>,
    identity: &Identity,
    now: DateTime<Utc>,
) -> Result<Upserted> {
    identity.validate()?;

    if let Some(mut record) = existing {
        let outcome = record.merge(identity, now);
        return Ok(Upserted { record, outcome });
    }

    if let Some(deleted_at) = tombstone
        && !identity.outlives(deleted_at)
    {
        return Err(StoreError::superseded(&identity.key()));
    }

    Ok(Upserted {
        record: UserRecord::create(identity, tombstone, now),
        outcome: MergeOutcome::Applied,
    })
}

/// Refuse a deprovision that is older than the last event applied to the
/// record, and pick the tombstone time to keep.
pub(crate) fn plan_delete(
    key: &IdentityKey,
    existing: Option<&UserRecord>,
    tombstone: Option<DateTime<Utc>>,
    deprovisioned_at: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if existing.is_some_and(|record| !record.deletable_at(deprovisioned_at)) {
        return Err(StoreError::superseded(key));
    }

    Ok(tombstone.map_or(deprovisioned_at, |t| t.max(deprovisioned_at)))
}
