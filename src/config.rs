//! Capacity and length bounds for the configuration model.
//!
//! These constants bound every collection and text field in the domain.
//! They are part of the persisted-data contract: shrinking them would
//! orphan records already written to flash, so treat them as frozen.

/// Maximum number of zones a hardware variant may allocate.
pub const MAX_ZONE_COUNT: usize = 64;

/// Maximum number of plannings that can exist at once.
pub const MAX_PLANNING_COUNT: usize = 32;

/// Maximum number of slots within a single planning.
pub const MAX_PLANNING_SLOT_COUNT: usize = 64;

/// Maximum number of hardware definitions registered at startup.
pub const MAX_HARDWARE_COUNT: usize = 4;

/// Bound for short identifiers (zone ids, parameter ids, order ids).
pub const MAX_LEN_ID: usize = 16;

/// Bound for string-typed hardware parameter values.
pub const MAX_LEN_VALUE: usize = 32;

/// Bound for human-facing descriptions (zones, plannings).
pub const MAX_LEN_DESCRIPTION: usize = 128;

/// Period of the resolution/apply tick driven by the main loop.
pub const TICK_PERIOD_MS: u32 = 1000;

/// NVS limits both namespace and key names to 15 characters.
pub const MAX_LEN_STORE_NAME: usize = 15;
