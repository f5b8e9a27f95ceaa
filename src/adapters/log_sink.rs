//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production). The API layer's
//! server-sent-events adapter would implement the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::HardwareReady { id, zones } => {
                info!("HW    | {id} ready, {zones} zones");
            }
            AppEvent::HardwareDisabled { reason } => {
                info!("HW    | disabled: {reason}");
            }
            AppEvent::ZoneOrderChanged { zone, from, to } => {
                info!(
                    "ZONE  | {zone}: {} -> {}",
                    from.info().id,
                    to.info().id
                );
            }
            AppEvent::OverrideChanged { order } => match order {
                Some(order) => info!("FORCE | override active: {}", order.info().id),
                None => info!("FORCE | override dropped"),
            },
            AppEvent::PlanningRemoved { id } => {
                info!("PLAN  | planning {id} removed");
            }
        }
    }
}
