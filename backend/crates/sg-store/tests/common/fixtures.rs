use sg_core::{EventType, Identity, IdentityKey, WebhookEvent};

use chrono::{DateTime, TimeZone, Utc};

pub const PROVIDER: &str = "authentik";

/// Fixed instant offset by `secs`, so ordering in tests is explicit.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_800_000_000 + secs, 0).unwrap()
}

pub fn key(external_id: &str) -> IdentityKey {
    IdentityKey::new(PROVIDER, external_id)
}

/// Identity as the trusted-header resolver would produce it.
pub fn header_identity(external_id: &str, email: &str) -> Identity {
    Identity {
        external_id: external_id.to_string(),
        provider: PROVIDER.to_string(),
        email: email.to_string(),
        username: external_id.to_string(),
        display_name: String::new(),
        groups: None,
        last_seen_at: Utc::now(),
        source_event_at: None,
    }
}

/// Identity built from a provider webhook that occurred at `occurred_at`.
pub fn event_identity(external_id: &str, email: &str, occurred_at: DateTime<Utc>) -> Identity {
    Identity {
        last_seen_at: occurred_at,
        source_event_at: Some(occurred_at),
        ..header_identity(external_id, email)
    }
}

pub fn webhook_event(event_id: &str) -> WebhookEvent {
    WebhookEvent {
        event_id: event_id.to_string(),
        event_type: EventType::UserUpdated,
        occurred_at: at(0),
        raw_payload: serde_json::json!({ "externalId": "u-1" }),
    }
}
