//! Boot paths: hardware selection, parameter overlay, zone and
//! planning loading, and every degrade-to-defaults branch.

use pilotwire::app::events::AppEvent;
use pilotwire::app::ports::StoragePort;
use pilotwire::app::service::Controller;
use pilotwire::clock::{WeekTime, Weekday};
use pilotwire::orders::OrderId;
use pilotwire::zones::ZoneMode;

use crate::mock_store::{MemoryStore, RecordingSink, booted, m1e1_store, registry};

#[test]
fn no_selected_hardware_is_a_terminal_idle_state() {
    let store = MemoryStore::new();
    let mut controller = Controller::new(store.clone(), registry());
    let mut sink = RecordingSink::new();
    controller.boot(&mut sink);

    assert_eq!(controller.current_hardware(), None);
    assert!(controller.zones().is_empty());
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::HardwareDisabled { reason } if *reason == "no hardware selected"
    )));

    // Ticking while idle is a no-op, not an error.
    let now = WeekTime::new(Weekday::Monday, 8, 0, 0).unwrap();
    controller.tick(&now, &mut sink);
}

#[test]
fn unknown_hardware_id_disables_the_controller() {
    let mut store = MemoryStore::new();
    store.set_str("pilotwire", "hardware", "GHOST").unwrap();

    let mut controller = Controller::new(store.clone(), registry());
    let mut sink = RecordingSink::new();
    controller.boot(&mut sink);

    assert_eq!(controller.current_hardware(), None);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::HardwareDisabled { reason } if *reason == "unknown hardware id"
    )));
}

#[test]
fn failing_hardware_init_disables_the_controller() {
    // e1_count defaults to 0 boards, which M1E1 refuses.
    let mut store = MemoryStore::new();
    store.set_str("pilotwire", "hardware", "M1E1").unwrap();

    let mut controller = Controller::new(store.clone(), registry());
    let mut sink = RecordingSink::new();
    controller.boot(&mut sink);

    assert_eq!(controller.current_hardware(), None);
    assert!(controller.zones().is_empty());
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::HardwareDisabled { reason } if *reason == "hardware init failed"
    )));
}

#[test]
fn m1e1_boot_allocates_zones_from_the_board_count() {
    let store = m1e1_store(2);
    let mut controller = Controller::new(store.clone(), registry());
    let mut sink = RecordingSink::new();
    controller.boot(&mut sink);

    assert_eq!(controller.current_hardware(), Some("M1E1"));
    assert_eq!(controller.zones().len(), 8);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::HardwareReady { id: "M1E1", zones: 8 }
    )));
}

#[test]
fn zone_records_are_loaded_from_the_store() {
    let mut store = m1e1_store(1);
    store.set_str("zn_M1E1", "e1z1", "0:3:Salon").unwrap();
    store.set_str("zn_M1E1", "e1z2", "1:4:Chambre").unwrap();

    let controller = booted(&store);

    let z1 = controller.zones().iter().find(|z| z.id == "e1z1").unwrap();
    assert_eq!(z1.mode, ZoneMode::Fixed(OrderId::Cozy));
    assert_eq!(z1.description.as_str(), "Salon");

    let z2 = controller.zones().iter().find(|z| z.id == "e1z2").unwrap();
    assert_eq!(z2.mode, ZoneMode::Planning(4));
    assert_eq!(z2.description.as_str(), "Chambre");
}

#[test]
fn corrupt_or_missing_zone_records_degrade_to_defaults() {
    let mut store = m1e1_store(1);
    store.set_str("zn_M1E1", "e1z1", "totally broken").unwrap();
    store.set_str("zn_M1E1", "e1z2", "0:6:bad order").unwrap();
    // e1z3 / e1z4 have no record at all.

    let controller = booted(&store);
    for zone in controller.zones() {
        assert_eq!(zone.mode, ZoneMode::Fixed(OrderId::NoFreeze), "{}", zone.id);
        // The hardware-assigned description survives.
        assert_eq!(zone.description.as_str(), zone.id.as_str());
    }
}

#[test]
fn parameters_keep_compiled_in_defaults_on_miss() {
    let mut store = MemoryStore::new();
    store.set_str("pilotwire", "hardware", "ESP32").unwrap();

    let controller = booted(&store);
    let hw = controller.registry().find("ESP32").unwrap();
    assert_eq!(hw.params()[0].as_text(), Some("foo"));
    assert_eq!(hw.params()[1].as_i32(), Some(42));
}

#[test]
fn stored_parameter_values_overlay_defaults() {
    let mut store = MemoryStore::new();
    store.set_str("pilotwire", "hardware", "ESP32").unwrap();
    store.set_str("hw_ESP32", "sample_param", "bar").unwrap();
    store.set_i32("hw_ESP32", "another_param", 7).unwrap();

    let controller = booted(&store);
    let hw = controller.registry().find("ESP32").unwrap();
    assert_eq!(hw.params()[0].as_text(), Some("bar"));
    assert_eq!(hw.params()[1].as_i32(), Some(7));
}

#[test]
fn override_record_is_loaded_at_boot() {
    let mut store = m1e1_store(1);
    store.set_str("pilotwire", "override", "cozy").unwrap();
    assert_eq!(booted(&store).override_get(), Some(OrderId::Cozy));

    store.set_str("pilotwire", "override", "none").unwrap();
    assert_eq!(booted(&store).override_get(), None);

    store.set_str("pilotwire", "override", "garbage").unwrap();
    assert_eq!(booted(&store).override_get(), None);
}

#[test]
fn plannings_and_slots_are_loaded_at_boot() {
    let mut store = m1e1_store(1);
    store.set_str("plans", "0", "semaine").unwrap();
    store.set_str("plan_0", "0", "0:0:0:3").unwrap();
    store.set_str("plan_0", "1", "1:8:30:2").unwrap();
    store.set_str("plan_0", "2", "this one is rotten").unwrap();

    let controller = booted(&store);
    let planning = controller.plannings().find(0).unwrap();
    assert_eq!(planning.description.as_str(), "semaine");
    // The corrupt slot was skipped, not fatal.
    assert_eq!(planning.slots().len(), 2);
    assert!(planning.find_slot(1).is_some());
}

#[test]
fn missing_anchor_is_recreated_and_persisted() {
    let mut store = m1e1_store(1);
    store.set_str("plans", "5", "mutile").unwrap();
    store.set_str("plan_5", "0", "2:12:0:3").unwrap();

    let controller = booted(&store);
    let planning = controller.plannings().find(5).unwrap();
    assert!(planning.slots().iter().any(|s| s.is_anchor()));

    // The recreated anchor reached the store with a fresh slot id.
    assert_eq!(store.raw_str("plan_5", "1").as_deref(), Some("0:0:0:1"));
}

#[test]
fn planning_id_watermark_survives_reboot_for_live_ids() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let a = controller.planning_create("jour").unwrap();
    let b = controller.planning_create("nuit").unwrap();
    assert_eq!((a, b), (0, 1));

    // A fresh boot over the same store allocates past the loaded ids.
    let mut controller = booted(&store);
    let c = controller.planning_create("weekend").unwrap();
    assert_eq!(c, 2);
}
