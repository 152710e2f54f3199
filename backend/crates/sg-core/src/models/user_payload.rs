use crate::{CoreError, CoreResult, Identity, IdentityKey};

use std::panic::Location;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::Deserialize;

/// User section of a webhook `payload`.
///
/// Only `externalId` is mandatory; `provider` falls back to the
/// configured default provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub external_id: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
}

impl UserPayload {
    #[track_caller]
    pub fn from_value(event_type: &str, value: &serde_json::Value) -> CoreResult<Self> {
        let payload: Self =
            serde_json::from_value(value.clone()).map_err(|e| CoreError::InvalidPayload {
                event_type: event_type.to_string(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if payload.external_id.trim().is_empty() {
            return Err(CoreError::InvalidPayload {
                event_type: event_type.to_string(),
                message: "externalId cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(payload)
    }

    pub fn key(&self, default_provider: &str) -> IdentityKey {
        IdentityKey::new(self.provider_or(default_provider), self.external_id.trim())
    }

    /// Identity stamped with the event time, used for ordering in the store.
    pub fn into_identity(self, default_provider: &str, occurred_at: DateTime<Utc>) -> Identity {
        let provider = self.provider_or(default_provider);

        Identity {
            external_id: self.external_id.trim().to_string(),
            provider,
            email: self.email.unwrap_or_default(),
            username: self.username.unwrap_or_default(),
            display_name: self.display_name.unwrap_or_default(),
            groups: self.groups,
            last_seen_at: occurred_at,
            source_event_at: Some(occurred_at),
        }
    }

    fn provider_or(&self, default_provider: &str) -> String {
        match self.provider.as_deref().map(str::trim) {
            Some(provider) if !provider.is_empty() => provider.to_string(),
            _ => default_provider.to_string(),
        }
    }
}
