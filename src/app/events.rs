//! Outbound application events.
//!
//! The [`Controller`](super::service::Controller) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them.

use crate::orders::OrderId;
use crate::zones::{PlanningId, ZoneId};

/// Structured events emitted by the configuration core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Hardware initialisation succeeded; the zone set is live.
    HardwareReady { id: &'static str, zones: usize },

    /// No usable hardware: the controller idles until reconfigured.
    HardwareDisabled { reason: &'static str },

    /// A zone's resolved order changed during a tick.
    ZoneOrderChanged {
        zone: ZoneId,
        from: OrderId,
        to: OrderId,
    },

    /// The global override was enabled (`Some(order)`) or dropped.
    OverrideChanged { order: Option<OrderId> },

    /// A planning was deleted (zones referencing it were reset).
    PlanningRemoved { id: PlanningId },
}
