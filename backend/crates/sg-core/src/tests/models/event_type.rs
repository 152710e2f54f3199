use crate::EventType;

use std::str::FromStr;

#[test]
fn test_event_type_round_trips_known_names() {
    for name in [
        "user.created",
        "user.updated",
        "user.deleted",
        "membership.changed",
    ] {
        let Ok(event_type) = EventType::from_str(name);
        assert!(event_type.is_known());
        assert_eq!(event_type.as_str(), name);
    }
}

#[test]
fn test_event_type_keeps_unknown_name() {
    let Ok(event_type) = EventType::from_str("group.renamed");

    assert_eq!(event_type, EventType::Unknown("group.renamed".to_string()));
    assert!(!event_type.is_known());
    assert_eq!(event_type.to_string(), "group.renamed");
}
