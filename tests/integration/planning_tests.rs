//! Planning and slot CRUD through the controller, including the
//! persist-first discipline and the deletion cascade.

use pilotwire::app::ports::StoragePort;
use pilotwire::error::{Error, ValidationError};
use pilotwire::orders::OrderId;
use pilotwire::planning::SlotPatch;
use pilotwire::zones::ZoneMode;

use crate::mock_store::{NullSink, booted, m1e1_store};

#[test]
fn create_persists_record_and_anchor() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    let id = controller.planning_create("semaine").unwrap();
    assert_eq!(id, 0);

    let planning = controller.plannings().find(id).unwrap();
    assert_eq!(planning.slots().len(), 1);
    let anchor = &planning.slots()[0];
    assert!(anchor.is_anchor());
    assert_eq!(anchor.order_id, OrderId::NoFreeze);

    // Exactly what reached flash, in the frozen grammar.
    assert_eq!(store.raw_str("plans", "0").as_deref(), Some("semaine"));
    assert_eq!(store.raw_str("plan_0", "0").as_deref(), Some("0:0:0:1"));
}

#[test]
fn duplicate_description_fails_and_leaves_the_first_intact() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    let first = controller.planning_create("semaine").unwrap();
    let err = controller.planning_create("semaine").unwrap_err();
    assert_eq!(err, Error::Validation(ValidationError::DuplicateDescription));

    assert_eq!(controller.plannings().len(), 1);
    let planning = controller.plannings().find(first).unwrap();
    assert_eq!(planning.description.as_str(), "semaine");
    assert_eq!(planning.slots().len(), 1);
}

#[test]
fn create_rolls_back_when_the_anchor_cannot_be_persisted() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    // First write (the planning record) succeeds, the anchor write fails.
    store.fail_after_writes(1);
    assert!(controller.planning_create("semaine").is_err());
    store.heal_writes();

    assert!(controller.plannings().is_empty());
    assert_eq!(store.raw_str("plans", "0"), None);

    // The failed attempt left everything reusable.
    assert_eq!(controller.planning_create("semaine").unwrap(), 0);
}

#[test]
fn rename_checks_duplicates_and_persists() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let a = controller.planning_create("jour").unwrap();
    let b = controller.planning_create("nuit").unwrap();

    assert_eq!(
        controller.planning_rename(b, "jour").unwrap_err(),
        Error::Validation(ValidationError::DuplicateDescription)
    );
    // Renaming to its own description is a no-op, not a conflict.
    controller.planning_rename(a, "jour").unwrap();

    controller.planning_rename(b, "weekend").unwrap();
    assert_eq!(
        controller.plannings().find(b).unwrap().description.as_str(),
        "weekend"
    );
    assert_eq!(store.raw_str("plans", "1").as_deref(), Some("weekend"));
}

#[test]
fn delete_unknown_planning_fails() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    assert_eq!(
        controller.planning_delete(9, &mut NullSink).unwrap_err(),
        Error::Validation(ValidationError::UnknownPlanning)
    );
}

#[test]
fn delete_purges_storage_and_resets_referencing_zones() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);

    let id = controller.planning_create("semaine").unwrap();
    controller.zone_set_mode_planning("e1z1", id).unwrap();
    controller.zone_store("e1z1").unwrap();

    controller.planning_delete(id, &mut NullSink).unwrap();

    // Storage: slots namespace purged, registry record gone.
    assert!(store.keys("plan_0").is_empty());
    assert_eq!(store.raw_str("plans", "0"), None);

    // The referencing zone fell back to Fixed + default, persisted.
    let zone = controller.zones().iter().find(|z| z.id == "e1z1").unwrap();
    assert_eq!(zone.mode, ZoneMode::Fixed(OrderId::NoFreeze));
    assert_eq!(store.raw_str("zn_M1E1", "e1z1").as_deref(), Some("0:1:e1z1"));

    // Unrelated zones kept their configuration.
    let other = controller.zones().iter().find(|z| z.id == "e1z2").unwrap();
    assert_eq!(other.mode, ZoneMode::Fixed(OrderId::NoFreeze));
}

#[test]
fn slot_add_validates_before_persisting() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let id = controller.planning_create("p").unwrap();

    assert_eq!(
        controller.slot_add(99, 1, 8, 0, OrderId::Cozy).unwrap_err(),
        Error::Validation(ValidationError::UnknownPlanning)
    );
    assert_eq!(
        controller.slot_add(id, 7, 8, 0, OrderId::Cozy).unwrap_err(),
        Error::Validation(ValidationError::TimeOutOfRange)
    );
    assert_eq!(
        controller.slot_add(id, 1, 24, 0, OrderId::Cozy).unwrap_err(),
        Error::Validation(ValidationError::TimeOutOfRange)
    );

    let slot = controller.slot_add(id, 1, 8, 0, OrderId::Cozy).unwrap();
    assert_eq!(store.raw_str("plan_0", "1").as_deref(), Some("1:8:0:3"));

    // Same coordinates again: refused, slot set unchanged.
    let before: Vec<i32> = controller
        .plannings()
        .find(id)
        .unwrap()
        .slots()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(
        controller
            .slot_add(id, 1, 8, 0, OrderId::Economy)
            .unwrap_err(),
        Error::Validation(ValidationError::DuplicateSlot)
    );
    let after: Vec<i32> = controller
        .plannings()
        .find(id)
        .unwrap()
        .slots()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(before, after);
    assert_eq!(after, vec![0, slot]);
}

#[test]
fn slot_ids_are_monotonic_across_removal() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let id = controller.planning_create("p").unwrap();

    let a = controller.slot_add(id, 1, 8, 0, OrderId::Cozy).unwrap();
    controller.slot_remove(id, a).unwrap();
    let b = controller.slot_add(id, 1, 8, 0, OrderId::Cozy).unwrap();
    assert!(b > a);
    assert_eq!(store.raw_str("plan_0", &a.to_string()), None);
}

#[test]
fn anchor_slot_cannot_be_removed() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let id = controller.planning_create("p").unwrap();
    let anchor_id = controller.plannings().find(id).unwrap().slots()[0].id;

    assert_eq!(
        controller.slot_remove(id, anchor_id).unwrap_err(),
        Error::Validation(ValidationError::AnchorSlotProtected)
    );
    // Still present in memory and in the store.
    assert!(
        controller
            .plannings()
            .find(id)
            .unwrap()
            .find_slot(anchor_id)
            .is_some()
    );
    assert_eq!(store.raw_str("plan_0", "0").as_deref(), Some("0:0:0:1"));
}

#[test]
fn slot_update_is_all_or_nothing() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let id = controller.planning_create("p").unwrap();
    controller.slot_add(id, 1, 8, 0, OrderId::Economy).unwrap();
    let b = controller.slot_add(id, 2, 8, 0, OrderId::Cozy).unwrap();

    // Moving b onto a's coordinates is refused without partial mutation.
    let patch = SlotPatch {
        dow: Some(1),
        order_id: Some(OrderId::Offload),
        ..SlotPatch::default()
    };
    assert_eq!(
        controller.slot_update(id, b, &patch).unwrap_err(),
        Error::Validation(ValidationError::DuplicateSlot)
    );
    let slot_b = *controller.plannings().find(id).unwrap().find_slot(b).unwrap();
    assert_eq!(slot_b.dow.as_u8(), 2);
    assert_eq!(slot_b.order_id, OrderId::Cozy);

    // A valid combined move persists as a single record.
    let patch = SlotPatch {
        dow: Some(3),
        hour: Some(20),
        minute: Some(30),
        order_id: Some(OrderId::Offload),
    };
    controller.slot_update(id, b, &patch).unwrap();
    assert_eq!(
        store.raw_str("plan_0", &b.to_string()).as_deref(),
        Some("3:20:30:0")
    );

    // Anchor relocation refused through the patch path too.
    let anchor_id = 0;
    let patch = SlotPatch {
        minute: Some(30),
        ..SlotPatch::default()
    };
    assert_eq!(
        controller.slot_update(id, anchor_id, &patch).unwrap_err(),
        Error::Validation(ValidationError::AnchorSlotProtected)
    );
}

#[test]
fn failed_persists_leave_memory_unchanged() {
    let store = m1e1_store(1);
    let mut controller = booted(&store);
    let id = controller.planning_create("p").unwrap();

    store.fail_writes();

    assert!(controller.slot_add(id, 1, 8, 0, OrderId::Cozy).is_err());
    assert_eq!(controller.plannings().find(id).unwrap().slots().len(), 1);

    assert!(controller.planning_rename(id, "renamed").is_err());
    assert_eq!(
        controller.plannings().find(id).unwrap().description.as_str(),
        "p"
    );

    assert!(controller.planning_create("q").is_err());
    assert_eq!(controller.plannings().len(), 1);

    store.heal_writes();
}
