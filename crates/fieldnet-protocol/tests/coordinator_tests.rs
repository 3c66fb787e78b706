mod common;

use common::{deliver, from, patrol, surveyor_beacon, Destination, RecordingProvider};
use fieldnet_protocol::{Agent, Coordinator, CoordinatorLedger, LedgerEntry, ProtocolConfig};
use fieldnet_wire::{Body, Message, Role};

fn coordinator() -> (Coordinator, RecordingProvider) {
    let mut coordinator = Coordinator::new(ProtocolConfig::default());
    let mut provider = RecordingProvider::new(0);
    coordinator.initialize(&mut provider);
    (coordinator, provider)
}

fn idle_beacon(id: u64, away: bool) -> Message {
    from(
        Role::Surveyor,
        id,
        Body::Beacon {
            position: None,
            waypoints: Some(Vec::new()),
            away: Some(away),
            weight: Some(1),
        },
    )
}

fn assignment() -> Body {
    Body::Assignment {
        waypoints: patrol(),
        depth: None,
    }
}

#[test]
fn test_first_round_broadcasts_assignment() {
    let (mut c, mut provider) = coordinator();
    provider.fire(&mut c);

    let sent = provider.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Destination::Broadcast);
    assert_eq!(sent[0].1.sender_role, Role::Coordinator);
    assert_eq!(sent[0].1.body, assignment());
    assert!(provider.only_timer().is_some());
}

#[test]
fn test_discovered_surveyor_gets_assignment() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, idle_beacon(3, false));

    let sent = provider.take_sent();
    assert_eq!(sent, vec![(Destination::Unicast(3), from(Role::Coordinator, 0, assignment()))]);
    assert_eq!(c.ledger().get(3), Some(&LedgerEntry::default()));
}

#[test]
fn test_later_rounds_only_target_unassigned_surveyors() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, idle_beacon(3, false));
    deliver(&mut c, &mut provider, surveyor_beacon(4, patrol(), 1));
    provider.take_sent();
    assert!(c.ledger().get(4).is_some_and(|entry| entry.assigned));

    provider.fire(&mut c);

    let sent = provider.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Destination::Unicast(3));
    assert_eq!(sent[0].1.body, assignment());
}

#[test]
fn test_away_surveyor_is_asked_for_its_report() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, idle_beacon(3, false));
    provider.take_sent();

    deliver(&mut c, &mut provider, idle_beacon(3, false));
    assert!(provider.take_sent().is_empty());

    deliver(&mut c, &mut provider, idle_beacon(3, true));
    let sent = provider.take_sent();
    assert_eq!(sent, vec![(Destination::Unicast(3), from(Role::Coordinator, 0, Body::DataRequest))]);
}

#[test]
fn test_report_updates_ledger_and_acknowledges() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, idle_beacon(3, true));
    provider.take_sent();

    deliver(&mut c, &mut provider, from(Role::Surveyor, 3, Body::Data { count: Some(4) }));

    let sent = provider.take_sent();
    assert_eq!(sent, vec![(Destination::Unicast(3), from(Role::Coordinator, 0, Body::Copy))]);
    let entry = c.ledger().get(3).cloned().unwrap();
    assert_eq!(entry.count, 4);
    assert!(entry.claimed);
    assert_eq!(c.total(), 4);

    // A claimed surveyor is not polled again.
    deliver(&mut c, &mut provider, idle_beacon(3, true));
    assert!(provider.take_sent().is_empty());
}

#[test]
fn test_repeated_report_overwrites_count() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, from(Role::Surveyor, 3, Body::Data { count: Some(4) }));
    deliver(&mut c, &mut provider, from(Role::Surveyor, 3, Body::Data { count: Some(6) }));
    assert_eq!(c.total(), 6);
}

#[test]
fn test_report_from_unknown_surveyor_creates_entry() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, from(Role::Surveyor, 9, Body::Data { count: Some(2) }));

    assert!(c.ledger().contains(9));
    assert_eq!(c.total(), 2);
    assert_eq!(provider.take_sent().len(), 1);
}

#[test]
fn test_data_without_count_leaves_ledger_untouched() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, idle_beacon(3, true));
    provider.take_sent();

    deliver(&mut c, &mut provider, from(Role::Surveyor, 3, Body::Data { count: None }));

    assert!(provider.take_sent().is_empty());
    assert_eq!(c.ledger().get(3), Some(&LedgerEntry::default()));
    assert_eq!(c.total(), 0);
}

#[test]
fn test_total_sums_reports_and_silent_surveyors_count_zero() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, idle_beacon(1, false));
    deliver(&mut c, &mut provider, from(Role::Surveyor, 2, Body::Data { count: Some(3) }));
    deliver(&mut c, &mut provider, from(Role::Surveyor, 3, Body::Data { count: Some(5) }));

    assert_eq!(c.ledger().len(), 3);
    assert_eq!(c.finish(), 8);
}

#[test]
fn test_sensor_traffic_is_ignored() {
    let (mut c, mut provider) = coordinator();
    deliver(&mut c, &mut provider, from(Role::Sensor, 7, Body::Data { count: Some(1) }));
    deliver(&mut c, &mut provider, from(Role::Sensor, 7, Body::DataRequest));

    assert!(c.ledger().is_empty());
    assert!(provider.take_sent().is_empty());
}

#[test]
fn test_ledger_entry_lookup_miss_inserts_default() {
    let mut ledger = CoordinatorLedger::new();
    assert!(ledger.get(5).is_none());

    ledger.entry(5).count = 2;
    ledger.entry(6);

    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.total(), 2);
    let ids: Vec<u64> = ledger.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![5, 6]);
}
