use crate::{CoreError, Identity, IdentityKey};

use chrono::{Duration, Utc};
use googletest::prelude::*;

fn identity() -> Identity {
    Identity {
        external_id: "u-1".to_string(),
        provider: "authentik".to_string(),
        email: "a@x.com".to_string(),
        username: "a".to_string(),
        display_name: "A".to_string(),
        groups: None,
        last_seen_at: Utc::now(),
        source_event_at: None,
    }
}

#[test]
fn given_complete_identity_when_validated_then_ok() {
    assert_that!(identity().validate(), ok(anything()));
}

#[test]
fn given_only_username_when_validated_then_ok() {
    let mut identity = identity();
    identity.email = String::new();

    assert_that!(identity.validate(), ok(anything()));
}

#[test]
fn given_no_email_and_no_username_when_validated_then_invalid() {
    let mut identity = identity();
    identity.email = String::new();
    identity.username = "   ".to_string();

    let result = identity.validate();

    assert!(matches!(result, Err(CoreError::InvalidIdentity { .. })));
}

#[test]
fn given_empty_external_id_when_validated_then_invalid() {
    let mut identity = identity();
    identity.external_id = String::new();

    assert_that!(identity.validate(), err(anything()));
}

#[test]
fn given_identity_when_keyed_then_provider_and_external_id_used() {
    let key = identity().key();

    assert_that!(key, eq(&IdentityKey::new("authentik", "u-1")));
    assert_that!(key.to_string(), eq("authentik:u-1"));
}

#[test]
fn given_sighting_when_compared_to_tombstone_then_always_outlives() {
    let deleted_at = Utc::now() + Duration::hours(1);

    assert!(identity().outlives(deleted_at));
}

#[test]
fn given_event_older_than_tombstone_when_compared_then_does_not_outlive() {
    let deleted_at = Utc::now();
    let mut identity = identity();
    identity.source_event_at = Some(deleted_at - Duration::seconds(5));

    assert!(!identity.outlives(deleted_at));

    identity.source_event_at = Some(deleted_at);
    assert!(!identity.outlives(deleted_at));

    identity.source_event_at = Some(deleted_at + Duration::seconds(5));
    assert!(identity.outlives(deleted_at));
}
