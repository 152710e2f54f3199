use crate::{Identity, MergeOutcome, UserRecord};

use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_800_000_000 + secs, 0).unwrap()
}

fn event_identity(email: &str, occurred_at: DateTime<Utc>) -> Identity {
    Identity {
        external_id: "u-1".to_string(),
        provider: "authentik".to_string(),
        email: email.to_string(),
        username: "a".to_string(),
        display_name: String::new(),
        groups: None,
        last_seen_at: occurred_at,
        source_event_at: Some(occurred_at),
    }
}

#[test]
fn test_create_starts_at_version_one() {
    let record = UserRecord::create(&event_identity("a@x.com", at(0)), None, at(10));

    assert_eq!(record.version, 1);
    assert_eq!(record.created_at, at(10));
    assert_eq!(record.updated_at, at(10));
    assert_eq!(record.source_event_at, Some(at(0)));
    assert!(record.groups.is_empty());
}

#[test]
fn test_create_over_tombstone_keeps_tombstone_as_floor() {
    let mut sighting = event_identity("a@x.com", at(0));
    sighting.source_event_at = None;

    let record = UserRecord::create(&sighting, Some(at(50)), at(60));

    assert_eq!(record.source_event_at, Some(at(50)));
}

#[test]
fn test_merge_newer_event_applies() {
    let mut record = UserRecord::create(&event_identity("old@x.com", at(0)), None, at(1));

    let outcome = record.merge(&event_identity("new@x.com", at(5)), at(6));

    assert_eq!(outcome, MergeOutcome::Applied);
    assert_eq!(record.email, "new@x.com");
    assert_eq!(record.source_event_at, Some(at(5)));
    assert_eq!(record.version, 2);
}

#[test]
fn test_merge_older_event_is_stale_and_changes_nothing() {
    let mut record = UserRecord::create(&event_identity("new@x.com", at(5)), None, at(6));
    let before = record.clone();

    let outcome = record.merge(&event_identity("old@x.com", at(0)), at(7));

    assert_eq!(outcome, MergeOutcome::Stale);
    assert_eq!(record, before);
}

#[test]
fn test_merge_both_orders_converge_on_later_event() {
    let early = event_identity("early@x.com", at(0));
    let late = event_identity("late@x.com", at(5));

    let mut in_order = UserRecord::create(&early, None, at(10));
    in_order.merge(&late, at(11));

    let mut reversed = UserRecord::create(&late, None, at(10));
    reversed.merge(&early, at(11));

    assert_eq!(in_order.email, "late@x.com");
    assert_eq!(reversed.email, "late@x.com");
    assert_eq!(in_order.source_event_at, reversed.source_event_at);
}

#[test]
fn test_merge_empty_fields_keep_stored_values() {
    let mut record = UserRecord::create(&event_identity("a@x.com", at(0)), None, at(1));
    let mut sighting = event_identity("", at(3));
    sighting.username = String::new();
    sighting.source_event_at = None;

    record.merge(&sighting, at(4));

    assert_eq!(record.email, "a@x.com");
    assert_eq!(record.username, "a");
    assert_eq!(record.last_seen_at, at(3));
    assert_eq!(record.source_event_at, Some(at(0)));
}

#[test]
fn test_merge_groups_replaced_only_when_present() {
    let mut identity = event_identity("a@x.com", at(0));
    identity.groups = Some(vec!["admins".to_string()]);
    let mut record = UserRecord::create(&identity, None, at(1));

    record.merge(&event_identity("a@x.com", at(2)), at(3));
    assert_eq!(record.groups, vec!["admins".to_string()]);

    let mut membership = event_identity("", at(4));
    membership.groups = Some(vec!["editors".to_string(), "viewers".to_string()]);
    record.merge(&membership, at(5));
    assert_eq!(record.groups, vec!["editors".to_string(), "viewers".to_string()]);
}

#[test]
fn test_merge_never_moves_updated_at_backwards() {
    let mut record = UserRecord::create(&event_identity("a@x.com", at(0)), None, at(100));

    record.merge(&event_identity("b@x.com", at(1)), at(50));

    assert_eq!(record.updated_at, at(100));
}

#[test]
fn test_deletable_at_respects_last_applied_event() {
    let record = UserRecord::create(&event_identity("a@x.com", at(10)), None, at(11));

    assert!(record.deletable_at(at(10)));
    assert!(record.deletable_at(at(20)));
    assert!(!record.deletable_at(at(10) - Duration::seconds(1)));
}
