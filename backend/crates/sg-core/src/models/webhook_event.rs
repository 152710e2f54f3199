use crate::{CoreError, CoreResult, EventType};

use std::panic::Location;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::Deserialize;

/// Wire envelope: `{eventId, type, occurredAt, payload}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    event_id: String,
    #[serde(rename = "type")]
    event_type: String,
    occurred_at: DateTime<Utc>,
    #[serde(default)]
    payload: serde_json::Value,
}

/// A verified provider webhook.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event_id: String,
    pub event_type: EventType,
    pub occurred_at: DateTime<Utc>,
    pub raw_payload: serde_json::Value,
}

impl WebhookEvent {
    /// Parse a signature-verified body.
    #[track_caller]
    pub fn from_slice(body: &[u8]) -> CoreResult<Self> {
        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| CoreError::MalformedEnvelope {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if envelope.event_id.trim().is_empty() {
            return Err(CoreError::MalformedEnvelope {
                message: "eventId cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if envelope.event_type.trim().is_empty() {
            return Err(CoreError::MalformedEnvelope {
                message: "type cannot be empty".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let Ok(event_type) = EventType::from_str(envelope.event_type.trim());

        Ok(Self {
            event_id: envelope.event_id.trim().to_string(),
            event_type,
            occurred_at: envelope.occurred_at,
            raw_payload: envelope.payload,
        })
    }
}
