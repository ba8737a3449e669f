//! End-to-end scenarios S1-S6, exercised against the public library API
//! rather than over a live socket (see SPEC_FULL.md §8).

use eddn_relay::predicate::Predicate;
use eddn_relay::relay::Relay;
use serde_json::json;

fn composite_predicate() -> Predicate {
    Predicate::from_description(&json!({
        "type": "all",
        "conditions": [
            {"type": "exact", "path": "$schemaRef", "value": "https://eddn.edcd.io/schemas/journal/1"},
            {"type": "any", "conditions": [
                {"type": "exact", "path": "message.event", "value": "Scan"},
                {"type": "regex", "path": "message.event", "pattern": ".*Jump.*"},
            ]},
        ],
    }))
    .unwrap()
}

#[test]
fn s1_schema_and_scan_event_matches() {
    let event = json!({
        "$schemaRef": "https://eddn.edcd.io/schemas/journal/1",
        "message": {"event": "Scan", "StarSystem": "Sol"},
    });
    assert!(composite_predicate().matches(&event));
}

#[test]
fn s2_fsdjump_matches_wrong_schema_does_not() {
    let predicate = composite_predicate();

    let jump = json!({
        "$schemaRef": "https://eddn.edcd.io/schemas/journal/1",
        "message": {"event": "FSDJump"},
    });
    assert!(predicate.matches(&jump));

    let wrong_schema = json!({
        "$schemaRef": "https://eddn.edcd.io/schemas/commodity/3",
        "message": {"event": "Scan"},
    });
    assert!(!predicate.matches(&wrong_schema));
}

#[test]
fn s3_list_existential_traversal() {
    let event = json!({"message": {"Bodies": [{"Name": "A"}, {"Name": "B"}]}});
    let predicate = Predicate::from_description(&json!({
        "type": "exact", "path": "message.Bodies.Name", "value": "B"
    }))
    .unwrap();
    assert!(predicate.matches(&event));
}

#[test]
fn s5_subscriber_sees_only_matching_event_after_filter() {
    let relay = Relay::new();
    let (id, mut rx) = relay.register();

    relay
        .update_predicate(id, &json!({"type": "exists", "path": "message.event"}))
        .unwrap();

    relay.process_event(&json!({"message": {"event": "Docked"}}));
    relay.process_event(&json!({"header": {"gatewayTimestamp": "2025-06-06T17:30:00Z"}}));

    let received = rx.try_recv().expect("first event delivered");
    assert!(received.contains("Docked"));
    assert!(rx.try_recv().is_err(), "second event must not be delivered");
}

#[test]
fn s6_malformed_regex_closes_subscriber_others_unaffected() {
    let relay = Relay::new();
    let (bad_id, _bad_rx) = relay.register();
    let (good_id, mut good_rx) = relay.register();

    let err = relay
        .update_predicate(bad_id, &json!({"type": "regex", "path": "x", "pattern": "["}))
        .unwrap_err();
    assert!(matches!(
        err,
        eddn_relay::error::PredicateError::InvalidRegex { .. }
    ));

    // The relay itself doesn't remove the subscriber on a construction
    // error — that's the transport layer's job (it owns the socket
    // lifecycle). What matters here is that the *other* subscriber's
    // delivery is entirely unaffected.
    relay.remove(bad_id);
    assert_eq!(relay.subscriber_count(), 1);

    relay.process_event(&json!({"message": {"event": "Docked"}}));
    assert!(good_rx.try_recv().is_ok());
    let _ = good_id;
}
