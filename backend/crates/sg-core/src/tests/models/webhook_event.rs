use crate::{CoreError, EventType, UserPayload, WebhookEvent};

use chrono::{TimeZone, Utc};
use googletest::prelude::*;

#[test]
fn given_valid_envelope_when_parsed_then_fields_extracted() {
    let body = br#"{
        "eventId": "evt-1",
        "type": "user.created",
        "occurredAt": "2026-10-19T10:00:00Z",
        "payload": {"externalId": "u-1", "email": "a@x.com"}
    }"#;

    let event = WebhookEvent::from_slice(body).unwrap();

    assert_that!(event.event_id, eq("evt-1"));
    assert_that!(event.event_type, eq(&EventType::UserCreated));
    assert_that!(
        event.occurred_at,
        eq(Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap())
    );
    assert_that!(event.raw_payload["externalId"].as_str(), some(eq("u-1")));
}

#[test]
fn given_unknown_type_when_parsed_then_kept_as_unknown() {
    let body = br#"{"eventId":"evt-2","type":"session.revoked","occurredAt":"2026-10-19T10:00:00Z"}"#;

    let event = WebhookEvent::from_slice(body).unwrap();

    assert_that!(
        event.event_type,
        eq(&EventType::Unknown("session.revoked".to_string()))
    );
}

#[test]
fn given_missing_event_id_when_parsed_then_malformed() {
    let body = br#"{"type":"user.created","occurredAt":"2026-10-19T10:00:00Z"}"#;

    let result = WebhookEvent::from_slice(body);

    assert!(matches!(result, Err(CoreError::MalformedEnvelope { .. })));
}

#[test]
fn given_blank_event_id_when_parsed_then_malformed() {
    let body = br#"{"eventId":"  ","type":"user.created","occurredAt":"2026-10-19T10:00:00Z"}"#;

    assert!(matches!(
        WebhookEvent::from_slice(body),
        Err(CoreError::MalformedEnvelope { .. })
    ));
}

#[test]
fn given_bad_timestamp_when_parsed_then_malformed() {
    let body = br#"{"eventId":"evt-3","type":"user.created","occurredAt":"yesterday"}"#;

    assert!(matches!(
        WebhookEvent::from_slice(body),
        Err(CoreError::MalformedEnvelope { .. })
    ));
}

#[test]
fn given_payload_without_provider_when_converted_then_default_provider_used() {
    let value = serde_json::json!({"externalId": " u-9 ", "username": "nine", "groups": ["ops"]});
    let occurred_at = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();

    let payload = UserPayload::from_value("user.updated", &value).unwrap();
    let identity = payload.into_identity("authentik", occurred_at);

    assert_that!(identity.provider, eq("authentik"));
    assert_that!(identity.external_id, eq("u-9"));
    assert_that!(identity.username, eq("nine"));
    assert_that!(identity.groups, some(eq(&vec!["ops".to_string()])));
    assert_that!(identity.source_event_at, some(eq(occurred_at)));
    assert_that!(identity.last_seen_at, eq(occurred_at));
}

#[test]
fn given_payload_without_external_id_when_parsed_then_invalid_payload() {
    let value = serde_json::json!({"email": "a@x.com"});

    let result = UserPayload::from_value("user.created", &value);

    assert!(matches!(result, Err(CoreError::InvalidPayload { .. })));
}
