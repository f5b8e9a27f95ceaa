//! Fuzz target: `PlanningSlot::decode`
//!
//! Arbitrary bytes through the persisted slot-record parser: must never
//! panic, and accepted records must stay within the slot invariants.
//!
//! cargo fuzz run fuzz_slot_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use pilotwire::planning::PlanningSlot;

fuzz_target!(|data: &[u8]| {
    let Ok(record) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(slot) = PlanningSlot::decode(7, record) {
        assert_eq!(slot.id, 7);
        assert!(slot.hour <= 23 && slot.minute <= 59);
        assert!(slot.week_offset_secs() < 7 * 86_400);
    }
});
