use crate::{CoreError, CoreResult, IdentityKey};

use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// A caller identity, either resolved from trusted proxy headers or built
/// from a provider webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub external_id: String,
    pub provider: String,
    /// May be empty when the proxy mapping omits it
    pub email: String,
    /// May be empty when the proxy mapping omits it
    pub username: String,
    pub display_name: String,
    /// `None` leaves stored group membership untouched
    pub groups: Option<Vec<String>>,
    pub last_seen_at: DateTime<Utc>,
    /// Provider `occurredAt` for webhook-sourced identities
    pub source_event_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn key(&self) -> IdentityKey {
        IdentityKey::new(&self.provider, &self.external_id)
    }

    /// An identity needs its key and at least one of email/username.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        if self.external_id.trim().is_empty() {
            return Err(CoreError::InvalidIdentity {
                message: "external_id cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.provider.trim().is_empty() {
            return Err(CoreError::InvalidIdentity {
                message: "provider cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if self.email.trim().is_empty() && self.username.trim().is_empty() {
            return Err(CoreError::InvalidIdentity {
                message: format!("{} has neither email nor username", self.key()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(())
    }

    pub fn is_event_sourced(&self) -> bool {
        self.source_event_at.is_some()
    }

    /// Whether this identity is newer than a deprovision recorded at `deleted_at`.
    ///
    /// Header sightings always are: the proxy just authenticated the caller.
    pub fn outlives(&self, deleted_at: DateTime<Utc>) -> bool {
        match self.source_event_at {
            Some(occurred_at) => occurred_at > deleted_at,
            None => true,
        }
    }
}
