//! Zones: one entry per physically controllable heating circuit.
//!
//! A zone's identity is assigned once by the hardware driver at
//! initialisation and never mutated by configuration operations. Its
//! mode decides how the current order is derived on every tick, either
//! a fixed order or a reference to a planning.
//!
//! The persisted record format (`"<mode>:<value>:<description>"`) is a
//! frozen on-flash grammar; controllers in the field already hold
//! records in it.

use heapless::String as BoundedString;
use serde::Serialize;

use crate::config::{MAX_LEN_DESCRIPTION, MAX_LEN_ID, MAX_ZONE_COUNT};
use crate::error::{Error, StorageError, ValidationError};
use crate::orders::{DEFAULT_ORDER, OrderId};

/// Planning ids are small non-negative integers, persisted as decimal.
pub type PlanningId = i32;

pub type ZoneId = BoundedString<MAX_LEN_ID>;
pub type Description = BoundedString<MAX_LEN_DESCRIPTION>;

/// Persisted mode discriminants (frozen).
const MODE_FIXED: i32 = 0;
const MODE_PLANNING: i32 = 1;

/// How a zone derives its current order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZoneMode {
    /// Always the same order.
    Fixed(OrderId),
    /// Follow a weekly planning.
    Planning(PlanningId),
}

impl ZoneMode {
    /// Encode mode + description into the persisted record string.
    pub fn encode(&self, description: &str) -> String {
        match self {
            ZoneMode::Fixed(order) => {
                format!("{}:{}:{}", MODE_FIXED, order.as_u8(), description)
            }
            ZoneMode::Planning(id) => format!("{}:{}:{}", MODE_PLANNING, id, description),
        }
    }

    /// Parse a persisted record. Rejects anything that does not round-trip
    /// through `encode`; callers degrade to defaults on `Err`.
    pub fn decode(record: &str) -> Result<(ZoneMode, Description), Error> {
        let mut parts = record.splitn(3, ':');
        let mode = parts
            .next()
            .and_then(|s| s.parse::<i32>().ok())
            .ok_or(StorageError::Corrupted)?;
        let value = parts
            .next()
            .and_then(|s| s.parse::<i32>().ok())
            .ok_or(StorageError::Corrupted)?;
        let description = parts.next().ok_or(StorageError::Corrupted)?;

        let description =
            Description::try_from(description).map_err(|()| StorageError::Corrupted)?;

        let mode = match mode {
            MODE_FIXED => ZoneMode::Fixed(
                OrderId::from_persisted(value).map_err(|_| StorageError::Corrupted)?,
            ),
            MODE_PLANNING if value >= 0 => ZoneMode::Planning(value),
            _ => return Err(StorageError::Corrupted.into()),
        };
        Ok((mode, description))
    }
}

/// One heating circuit.
#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    /// Hardware-assigned identity, unique within the set.
    pub id: ZoneId,
    pub description: Description,
    pub mode: ZoneMode,
    /// Order resolved on the last tick. Derived, not persisted.
    pub current: OrderId,
}

impl Zone {
    fn new(id: ZoneId, description: Description) -> Self {
        Self {
            id,
            description,
            mode: ZoneMode::Fixed(DEFAULT_ORDER),
            current: DEFAULT_ORDER,
        }
    }
}

/// The active hardware's zones: a dense arena looked up by stable id.
#[derive(Debug, Default, Serialize)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    pub fn new() -> Self {
        Self { zones: Vec::new() }
    }

    /// Register a zone during hardware `init`. Fails on capacity, bound
    /// or duplicate-id violations; all are wiring mistakes in the
    /// hardware driver, surfaced rather than asserted.
    pub fn add(&mut self, id: &str, description: &str) -> Result<(), Error> {
        if self.zones.len() >= MAX_ZONE_COUNT {
            return Err(ValidationError::CapacityExhausted.into());
        }
        let id = ZoneId::try_from(id).map_err(|()| ValidationError::TextTooLong)?;
        let description =
            Description::try_from(description).map_err(|()| ValidationError::TextTooLong)?;
        if self.find(&id).is_some() {
            return Err(ValidationError::DuplicateZone.into());
        }
        self.zones.push(Zone::new(id, description));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id.as_str() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.id.as_str() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Zone> {
        self.zones.iter_mut()
    }

    pub fn as_slice(&self) -> &[Zone] {
        &self.zones
    }
}

/// The global forcing switch: when active it masks every zone's mode.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Override {
    active: bool,
    order_id: OrderId,
}

impl Default for Override {
    fn default() -> Self {
        Self {
            active: false,
            order_id: DEFAULT_ORDER,
        }
    }
}

impl Override {
    pub fn enable(&mut self, order_id: OrderId) {
        self.active = true;
        self.order_id = order_id;
    }

    /// Deactivate; the stored order returns to the catalog default so a
    /// later read never exposes a stale forced order.
    pub fn disable(&mut self) {
        self.active = false;
        self.order_id = DEFAULT_ORDER;
    }

    pub fn get(&self) -> Option<OrderId> {
        self.active.then_some(self.order_id)
    }
}
