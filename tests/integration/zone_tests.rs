//! Zone mutation semantics: validate-then-mutate in memory, explicit
//! batched persistence, and system-level round-trips through the store.

use pilotwire::error::{Error, ValidationError};
use pilotwire::orders::OrderId;
use pilotwire::zones::ZoneMode;

use crate::mock_store::{booted, m1e1_store};

#[test]
fn mode_setters_do_not_touch_the_store() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    controller
        .zone_set_mode_fixed("e1z1", OrderId::Cozy)
        .unwrap();
    controller.zone_set_description("e1z1", "Salon").unwrap();

    // Nothing persisted yet: setters are memory-only by contract.
    assert_eq!(store.raw_str("zn_M1E1", "e1z1"), None);

    // One explicit store call commits the batched edit once.
    controller.zone_store("e1z1").unwrap();
    assert_eq!(
        store.raw_str("zn_M1E1", "e1z1").as_deref(),
        Some("0:3:Salon")
    );
}

#[test]
fn planning_mode_requires_an_existing_planning() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    assert_eq!(
        controller.zone_set_mode_planning("e1z1", 3).unwrap_err(),
        Error::Validation(ValidationError::UnknownPlanning)
    );

    let id = controller.planning_create("semaine").unwrap();
    controller.zone_set_mode_planning("e1z1", id).unwrap();
    controller.zone_store("e1z1").unwrap();
    assert_eq!(
        store.raw_str("zn_M1E1", "e1z1").as_deref(),
        Some("1:0:e1z1")
    );
}

#[test]
fn unknown_zone_is_refused() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    assert_eq!(
        controller
            .zone_set_mode_fixed("e9z9", OrderId::Cozy)
            .unwrap_err(),
        Error::Validation(ValidationError::UnknownZone)
    );
    assert_eq!(
        controller.zone_store("e9z9").unwrap_err(),
        Error::Validation(ValidationError::UnknownZone)
    );
}

#[test]
fn oversized_description_is_refused_before_mutation() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let oversized = "x".repeat(200);
    assert_eq!(
        controller
            .zone_set_description("e1z1", &oversized)
            .unwrap_err(),
        Error::Validation(ValidationError::TextTooLong)
    );
    let zone = controller.zones().iter().find(|z| z.id == "e1z1").unwrap();
    assert_eq!(zone.description.as_str(), "e1z1");
}

#[test]
fn zone_configuration_round_trips_through_a_reboot() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    let id = controller.planning_create("semaine").unwrap();
    controller.zone_set_mode_planning("e1z2", id).unwrap();
    controller.zone_set_description("e1z2", "Bureau").unwrap();
    controller.zone_store("e1z2").unwrap();
    drop(controller);

    let controller = booted(&store);
    let zone = controller.zones().iter().find(|z| z.id == "e1z2").unwrap();
    assert_eq!(zone.mode, ZoneMode::Planning(id));
    assert_eq!(zone.description.as_str(), "Bureau");
}

#[test]
fn failed_zone_persist_reports_and_keeps_memory() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    controller
        .zone_set_mode_fixed("e1z1", OrderId::Economy)
        .unwrap();
    store.fail_writes();
    assert!(controller.zone_store("e1z1").is_err());
    store.heal_writes();

    // The in-memory edit survives; a retry persists it.
    controller.zone_store("e1z1").unwrap();
    assert_eq!(
        store.raw_str("zn_M1E1", "e1z1").as_deref(),
        Some("0:2:e1z1")
    );
}
