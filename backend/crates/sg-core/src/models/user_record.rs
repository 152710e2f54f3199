use crate::{Identity, IdentityKey};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of folding an identity into an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    /// Older provider event than the one already applied; record untouched
    Stale,
}

/// Persisted form of an [`Identity`] in the shadow store.
///
/// Both store backends build and update records exclusively through
/// [`UserRecord::create`] and [`UserRecord::merge`], so merge semantics
/// cannot drift between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub external_id: String,
    pub provider: String,
    pub email: String,
    pub username: String,
    pub display_name: String,
    pub groups: Vec<String>,
    pub last_seen_at: DateTime<Utc>,
    /// `occurredAt` of the newest provider event applied to this record
    pub source_event_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Server-assigned write time, never taken from the caller
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl UserRecord {
    /// First sighting of a key.
    ///
    /// `tombstone` is the deprovision time left by an earlier delete; it
    /// becomes the event floor so older events cannot rewrite the profile.
    pub fn create(identity: &Identity, tombstone: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let source_event_at = match (identity.source_event_at, tombstone) {
            (Some(occurred_at), Some(deleted_at)) => Some(occurred_at.max(deleted_at)),
            (Some(occurred_at), None) => Some(occurred_at),
            (None, deleted_at) => deleted_at,
        };

        Self {
            external_id: identity.external_id.clone(),
            provider: identity.provider.clone(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            display_name: identity.display_name.clone(),
            groups: identity.groups.clone().unwrap_or_default(),
            last_seen_at: identity.last_seen_at,
            source_event_at,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Fold a later sighting or event into this record.
    ///
    /// Empty incoming fields keep the stored value. Provider events older
    /// than the last applied one are reported as stale and change nothing.
    pub fn merge(&mut self, identity: &Identity, now: DateTime<Utc>) -> MergeOutcome {
        if let (Some(incoming), Some(current)) = (identity.source_event_at, self.source_event_at)
            && incoming < current
        {
            return MergeOutcome::Stale;
        }

        overwrite_if_present(&mut self.email, &identity.email);
        overwrite_if_present(&mut self.username, &identity.username);
        overwrite_if_present(&mut self.display_name, &identity.display_name);

        if let Some(groups) = &identity.groups {
            self.groups = groups.clone();
        }

        if identity.source_event_at.is_some() {
            self.source_event_at = identity.source_event_at;
        }

        self.last_seen_at = self.last_seen_at.max(identity.last_seen_at);
        self.updated_at = now.max(self.updated_at);
        self.version += 1;

        MergeOutcome::Applied
    }

    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(&self.provider, &self.external_id)
    }

    /// Whether a deprovision at `deleted_at` is at least as new as the
    /// last provider event applied to this record.
    pub fn deletable_at(&self, deleted_at: DateTime<Utc>) -> bool {
        self.source_event_at
            .is_none_or(|applied_at| applied_at <= deleted_at)
    }
}

fn overwrite_if_present(target: &mut String, incoming: &str) {
    let incoming = incoming.trim();
    if !incoming.is_empty() {
        *target = incoming.to_string();
    }
}
