//! Fuzz target: `ZoneMode::decode`
//!
//! Drives arbitrary byte sequences through the persisted zone-record
//! parser and asserts that it never panics and that anything it accepts
//! re-encodes to the same record.
//!
//! cargo fuzz run fuzz_zone_record

#![no_main]

use libfuzzer_sys::fuzz_target;
use pilotwire::zones::ZoneMode;

fuzz_target!(|data: &[u8]| {
    let Ok(record) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok((mode, description)) = ZoneMode::decode(record) {
        // Whatever was accepted must round-trip through the canonical
        // encoding (the input itself may use non-canonical numerals).
        let reencoded = mode.encode(&description);
        let (mode2, description2) = ZoneMode::decode(&reencoded).expect("canonical form parses");
        assert_eq!(mode2, mode);
        assert_eq!(description2, description);
    }
});
