//! Panel publisher registry: per-tab lookups, sentinel reads, callback
//! ordering, tab removal, exclusion and verification refresh.

mod common;

use common::*;
use rewards_bridge::types::{LedgerResult, PublisherInfo, PublisherStatus};
use rewards_bridge::{BridgeConfig, BridgeError, BridgeEvent};

fn deliver(service: &ScriptedService, tab_id: u64, info: &PublisherInfo) {
    service.broadcast(|o| o.on_panel_publisher_info(LedgerResult::Ok, Some(info), tab_id));
}

// =============================================================================
// SECTION 1: Sentinel reads
// =============================================================================

#[test]
fn unknown_tab_reads_return_sentinels() {
    let (_service, bridge) = setup();

    assert_eq!(bridge.publisher_info(7), None);
    assert_eq!(bridge.publisher_url(7), "");
    assert_eq!(bridge.publisher_favicon_url(7), "");
    assert_eq!(bridge.publisher_name(7), "");
    assert_eq!(bridge.publisher_id(7), "");
    assert_eq!(bridge.publisher_percent(7), 0);
    assert!(!bridge.publisher_excluded(7));
    assert_eq!(bridge.publisher_status(7), PublisherStatus::NotVerified);
}

#[test]
fn negative_tab_ids_read_as_absent_and_are_rejected_for_fetch() {
    let (service, bridge) = setup();

    assert_eq!(bridge.publisher_name(-1), "");
    let err = bridge.fetch_publisher_info(-1, "example.com").unwrap_err();
    assert!(matches!(err, BridgeError::InvalidInput(_)));
    assert!(service.calls().is_empty());

    // No-op rather than error.
    bridge.remove_publisher_from_map(-3);
}

// =============================================================================
// SECTION 2: Lookup and callback ordering
// =============================================================================

#[test]
fn fetch_then_callback_populates_tab_and_emits_event() {
    let (service, bridge) = setup();
    let rx = bridge.subscribe();

    bridge.fetch_publisher_info(3, "brave.com").unwrap();
    assert_eq!(
        service.calls(),
        vec!["get_publisher_activity_from_url:3:brave.com".to_string()]
    );

    deliver(&service, 3, &publisher("brave.com", "Brave"));

    assert_eq!(bridge.publisher_name(3), "Brave");
    assert_eq!(bridge.publisher_id(3), "brave.com");
    assert_eq!(bridge.publisher_url(3), "https://brave.com/");
    assert_eq!(bridge.publisher_status(3), PublisherStatus::Verified);
    assert_eq!(bridge.publisher_info(3).unwrap().tab_id, Some(3));
    assert_eq!(drain(&rx), vec![BridgeEvent::PublisherInfoUpdated { tab_id: 3 }]);
    assert_eq!(bridge.pending_requests().len(), 0);
}

#[test]
fn reverse_order_callbacks_last_arrival_wins() {
    let (service, bridge) = setup();

    bridge.fetch_publisher_info(1, "a.com").unwrap();
    bridge.fetch_publisher_info(1, "b.com").unwrap();

    // The answer to the second fetch arrives first.
    deliver(&service, 1, &publisher("b.com", "B"));
    deliver(&service, 1, &publisher("a.com", "A"));

    assert_eq!(bridge.publisher_name(1), "A");
    let stats = bridge.correlator_stats();
    assert_eq!(stats.issued, 2);
    assert_eq!(stats.fulfilled, 2);
}

#[test]
fn tabs_are_independent() {
    let (service, bridge) = setup();

    deliver(&service, 1, &publisher("a.com", "A"));
    deliver(&service, 2, &publisher("b.com", "B"));

    assert_eq!(bridge.publisher_name(1), "A");
    assert_eq!(bridge.publisher_name(2), "B");
}

#[test]
fn unsolicited_callback_is_accepted() {
    let (service, bridge) = setup();

    deliver(&service, 9, &publisher("pushed.com", "Pushed"));

    assert_eq!(bridge.publisher_name(9), "Pushed");
}

#[test]
fn identical_callback_is_silent_when_suppression_enabled() {
    let (service, bridge) = setup();
    let rx = bridge.subscribe();
    let info = publisher("a.com", "A");

    deliver(&service, 1, &info);
    deliver(&service, 1, &info);

    assert_eq!(drain(&rx).len(), 1);
}

#[test]
fn identical_callback_re_emits_when_suppression_disabled() {
    let config = BridgeConfig {
        suppress_unchanged_events: false,
        ..BridgeConfig::default()
    };
    let (service, bridge) = setup_with(config);
    let rx = bridge.subscribe();
    let info = publisher("a.com", "A");

    deliver(&service, 1, &info);
    deliver(&service, 1, &info);

    assert_eq!(drain(&rx).len(), 2);
}

#[test]
fn percent_above_one_hundred_is_clamped() {
    let (service, bridge) = setup();
    let mut info = publisher("a.com", "A");
    info.percent = 250;

    deliver(&service, 1, &info);

    assert_eq!(bridge.publisher_percent(1), 100);
}

#[test]
fn failed_lookup_leaves_registry_untouched_and_reports_once() {
    let (service, bridge) = setup();
    deliver(&service, 1, &publisher("a.com", "A"));
    let rx = bridge.subscribe();

    bridge.fetch_publisher_info(1, "b.com").unwrap();
    service.broadcast(|o| o.on_panel_publisher_info(LedgerResult::NotFound, None, 1));
    // A repeat of the same failure has nothing left to resolve.
    service.broadcast(|o| o.on_panel_publisher_info(LedgerResult::NotFound, None, 1));

    assert_eq!(bridge.publisher_name(1), "A");
    assert_eq!(failures(&drain(&rx)), 1);
}

// =============================================================================
// SECTION 3: Tab removal
// =============================================================================

#[test]
fn remove_then_late_callback_is_discarded() {
    let (service, bridge) = setup();
    let rx = bridge.subscribe();

    bridge.fetch_publisher_info(4, "late.com").unwrap();
    bridge.remove_publisher_from_map(4);
    deliver(&service, 4, &publisher("late.com", "Late"));

    assert_eq!(bridge.publisher_info(4), None);
    assert!(drain(&rx).is_empty());
    assert_eq!(bridge.correlator_stats().discarded, 1);
    assert!(bridge.pending_requests().is_empty());
}

#[test]
fn remove_drops_cached_entry() {
    let (service, bridge) = setup();
    deliver(&service, 4, &publisher("a.com", "A"));

    bridge.remove_publisher_from_map(4);

    assert_eq!(bridge.publisher_name(4), "");
}

#[test]
fn new_fetch_after_remove_is_accepted() {
    let (service, bridge) = setup();

    bridge.remove_publisher_from_map(4);
    bridge.fetch_publisher_info(4, "again.com").unwrap();
    deliver(&service, 4, &publisher("again.com", "Again"));

    assert_eq!(bridge.publisher_name(4), "Again");
}

#[test]
fn remove_without_fetch_in_flight_leaves_no_tombstone() {
    let (service, bridge) = setup();
    deliver(&service, 4, &publisher("a.com", "A"));

    bridge.remove_publisher_from_map(4);
    deliver(&service, 4, &publisher("b.com", "B"));

    assert_eq!(bridge.publisher_name(4), "B");
    assert_eq!(bridge.correlator_stats().discarded, 0);
}

#[test]
fn late_callback_accepted_when_discard_disabled() {
    let config = BridgeConfig {
        discard_removed_tab_callbacks: false,
        ..BridgeConfig::default()
    };
    let (service, bridge) = setup_with(config);

    bridge.fetch_publisher_info(4, "late.com").unwrap();
    bridge.remove_publisher_from_map(4);
    deliver(&service, 4, &publisher("late.com", "Late"));

    assert_eq!(bridge.publisher_name(4), "Late");
}

// =============================================================================
// SECTION 4: Exclusion and refresh
// =============================================================================

#[test]
fn include_in_auto_contribution_unknown_tab_is_an_error() {
    let (service, bridge) = setup();

    let err = bridge.include_in_auto_contribution(5, true).unwrap_err();

    assert!(matches!(err, BridgeError::UnknownTab { tab_id: 5 }));
    assert_eq!(service.parked_count("set_publisher_exclude"), 0);
}

#[test]
fn exclude_updates_every_tab_showing_the_publisher() {
    let (service, bridge) = setup();
    deliver(&service, 1, &publisher("a.com", "A"));
    deliver(&service, 2, &publisher("a.com", "A"));
    deliver(&service, 3, &publisher("b.com", "B"));
    let rx = bridge.subscribe();

    bridge.include_in_auto_contribution(1, true).unwrap();
    assert!(service
        .calls()
        .contains(&"set_publisher_exclude:a.com:true".to_string()));
    assert!(!bridge.publisher_excluded(1), "cache changes only after the ledger confirms");

    service.complete("set_publisher_exclude", LedgerResult::Ok, ());

    assert!(bridge.publisher_excluded(1));
    assert!(bridge.publisher_excluded(2));
    assert!(!bridge.publisher_excluded(3));
    let events = drain(&rx);
    assert!(events.contains(&BridgeEvent::PublisherInfoUpdated { tab_id: 1 }));
    assert!(events.contains(&BridgeEvent::PublisherInfoUpdated { tab_id: 2 }));
    assert!(!events.contains(&BridgeEvent::PublisherInfoUpdated { tab_id: 3 }));
}

#[test]
fn exclude_failure_keeps_flag() {
    let (service, bridge) = setup();
    deliver(&service, 1, &publisher("a.com", "A"));
    let rx = bridge.subscribe();

    bridge.include_in_auto_contribution(1, true).unwrap();
    service.complete("set_publisher_exclude", LedgerResult::Error, ());

    assert!(!bridge.publisher_excluded(1));
    assert_eq!(failures(&drain(&rx)), 1);
}

#[test]
fn refresh_publisher_updates_status_across_tabs() {
    let (service, bridge) = setup();
    let mut info = publisher("a.com", "A");
    info.status = PublisherStatus::NotVerified;
    deliver(&service, 1, &info);
    let rx = bridge.subscribe();

    bridge.refresh_publisher("a.com").unwrap();
    service.complete("refresh_publisher", LedgerResult::Ok, PublisherStatus::Connected);

    assert_eq!(bridge.publisher_status(1), PublisherStatus::Connected);
    let events = drain(&rx);
    assert!(events.contains(&BridgeEvent::PublisherInfoUpdated { tab_id: 1 }));
    assert!(events.contains(&BridgeEvent::PublisherRefreshed {
        publisher_key: "a.com".to_string(),
        status: PublisherStatus::Connected,
    }));
}
