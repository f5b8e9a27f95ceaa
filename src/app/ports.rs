//! Port traits — the hexagonal boundary between domain logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (the NVS store, hardware boards, event sinks)
//! implement these traits. The [`Controller`](super::service::Controller)
//! consumes them via generics or trait objects, so the domain core never
//! touches flash or GPIO directly — and every test runs against in-memory
//! fakes.

use crate::clock::WeekTime;
use crate::error::{Result, StorageError};
use crate::hw::HwParam;
use crate::zones::ZoneSet;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Namespaced, typed key-value persistence.
///
/// Every setter commits before returning — each call is one atomic
/// open / operate / commit / close cycle on the backend, so a power cut
/// never leaves a half-written record. Getters return `None` for both
/// absent keys and backend read errors: loaders treat the two alike and
/// fall back to compiled-in defaults.
pub trait StoragePort {
    fn get_i32(&self, ns: &str, key: &str) -> Option<i32>;

    fn set_i32(&mut self, ns: &str, key: &str, value: i32) -> core::result::Result<(), StorageError>;

    fn get_str(&self, ns: &str, key: &str) -> Option<String>;

    fn set_str(&mut self, ns: &str, key: &str, value: &str)
    -> core::result::Result<(), StorageError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&mut self, ns: &str, key: &str) -> core::result::Result<(), StorageError>;

    /// Delete every key in a namespace.
    fn clear(&mut self, ns: &str) -> core::result::Result<(), StorageError>;

    /// Enumerate the keys of a namespace, in unspecified order.
    fn keys(&self, ns: &str) -> Vec<String>;
}

// ───────────────────────────────────────────────────────────────
// Hardware port (driven adapter: domain → physical outputs)
// ───────────────────────────────────────────────────────────────

/// One supported hardware variant (the init/apply hook pair).
///
/// `init` runs once at boot, after the variant's parameter values have
/// been overlaid from persistence: it allocates and names the zone set
/// and brings up its electronics. It must not touch zone modes or
/// current orders — the controller loads and resolves those afterwards.
///
/// `apply` runs every tick and pushes each zone's resolved order to the
/// physical outputs, typically through
/// [`OrderId::signal`](crate::orders::OrderId::signal) with the same
/// clock instant the resolution pass used.
pub trait HardwareDriver {
    /// Stable identifier, also the persistence namespace discriminator.
    fn id(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn params(&self) -> &[HwParam];

    fn params_mut(&mut self) -> &mut [HwParam];

    fn init(&mut self) -> Result<ZoneSet>;

    fn apply(&mut self, zones: &ZoneSet, now: &WeekTime) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, the
/// API layer's server-sent events, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
