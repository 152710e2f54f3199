use crate::shadow_store::{fold_identity, plan_delete};
use crate::{EventEffect, EventMutation, Result, ShadowStore, StoreError, Upserted};

use sg_core::{Identity, IdentityKey, MergeOutcome, UserRecord, WebhookEvent};

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use tokio::sync::RwLock;

/// Repeat the data-loss reminder after this many upserts.
pub const WARN_EVERY_UPSERTS: u64 = 100;

#[derive(Default)]
struct State {
    users: BTreeMap<IdentityKey, UserRecord>,
    tombstones: HashMap<IdentityKey, DateTime<Utc>>,
    events: HashMap<String, DateTime<Utc>>,
}

impl State {
    fn upsert(&mut self, identity: &Identity) -> Result<Upserted> {
        let key = identity.key();
        let existing = self.users.get(&key).cloned();
        let had_record = existing.is_some();
        let tombstone = self.tombstones.get(&key).copied();

        let upserted = fold_identity(existing, tombstone, identity, Utc::now())?;

        if upserted.outcome == MergeOutcome::Applied {
            self.users.insert(key.clone(), upserted.record.clone());
            if !had_record {
                self.tombstones.remove(&key);
            }
        }
        Ok(upserted)
    }

    /// Returns whether a record was removed.
    fn delete(&mut self, key: &IdentityKey, deprovisioned_at: DateTime<Utc>) -> Result<bool> {
        let tombstone_at = plan_delete(
            key,
            self.users.get(key),
            self.tombstones.get(key).copied(),
            deprovisioned_at,
        )?;

        self.tombstones.insert(key.clone(), tombstone_at);
        Ok(self.users.remove(key).is_some())
    }
}

/// Process-lifetime shadow store. Every record is gone after a restart.
pub struct MemoryStore {
    state: RwLock<State>,
    upserts: AtomicU64,
}

impl MemoryStore {
    /// `acknowledged` reduces the startup banner to one line; the periodic
    /// reminder on writes is emitted either way.
    pub fn new(acknowledged: bool) -> Self {
        if acknowledged {
            warn!("Shadow store is IN-MEMORY (acknowledged): shadow users are lost on restart");
        } else {
            warn!("==============================================================");
            warn!("  SHADOW STORE IS RUNNING IN MEMORY");
            warn!("  Every shadow user and webhook receipt is lost on restart.");
            warn!("  Set store.backend = \"sqlite\" for durable storage, or");
            warn!("  store.acknowledge_ephemeral = true to silence this banner.");
            warn!("==============================================================");
        }

        Self {
            state: RwLock::new(State::default()),
            upserts: AtomicU64::new(0),
        }
    }

    fn remind(&self, users: usize) {
        let written = self.upserts.fetch_add(1, Ordering::Relaxed) + 1;
        if written % WARN_EVERY_UPSERTS == 0 {
            warn!(
                "Memory shadow store has taken {} upserts; {} shadow users will be lost on restart",
                written, users
            );
        }
    }
}

#[async_trait]
impl ShadowStore for MemoryStore {
    async fn get(&self, key: &IdentityKey) -> Result<UserRecord> {
        let state = self.state.read().await;
        state
            .users
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn upsert(&self, identity: &Identity) -> Result<Upserted> {
        let mut state = self.state.write().await;
        let upserted = state.upsert(identity)?;

        let users = state.users.len();
        drop(state);
        self.remind(users);

        Ok(upserted)
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        let state = self.state.read().await;
        Ok(state.users.values().cloned().collect())
    }

    async fn delete(&self, key: &IdentityKey, deprovisioned_at: DateTime<Utc>) -> Result<()> {
        let removed = self.state.write().await.delete(key, deprovisioned_at)?;
        if removed {
            Ok(())
        } else {
            Err(StoreError::not_found(key))
        }
    }

    async fn apply_event(
        &self,
        event: &WebhookEvent,
        mutation: EventMutation,
    ) -> Result<EventEffect> {
        let mut state = self.state.write().await;
        if state.events.contains_key(&event.event_id) {
            return Ok(EventEffect::Duplicate);
        }

        let effect = match mutation {
            EventMutation::Upsert(identity) => match state.upsert(&identity) {
                Ok(upserted) => EventEffect::Upserted(upserted),
                Err(StoreError::Superseded { .. }) => EventEffect::Superseded,
                Err(e) => return Err(e),
            },
            EventMutation::Delete {
                key,
                deprovisioned_at,
            } => match state.delete(&key, deprovisioned_at) {
                Ok(true) => EventEffect::Deleted,
                Ok(false) => EventEffect::NotFound,
                Err(StoreError::Superseded { .. }) => EventEffect::Superseded,
                Err(e) => return Err(e),
            },
        };
        state.events.insert(event.event_id.clone(), Utc::now());

        let wrote_user = matches!(effect, EventEffect::Upserted(_));
        let users = state.users.len();
        drop(state);
        if wrote_user {
            self.remind(users);
        }

        Ok(effect)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
