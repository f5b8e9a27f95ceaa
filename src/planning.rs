//! Plannings: named weekly schedules made of time slots.
//!
//! A planning maps instants of the week to heating orders. Resolution
//! answers "which slot fired most recently?" — the last event at or
//! before now on the 7-day ring. Every planning keeps an undeletable,
//! unmovable slot at Sunday 00:00 (the anchor), so resolution always
//! has a candidate for any instant of the week.
//!
//! This module owns the in-memory arena and its invariants; the
//! application service orchestrates persistence around it.

use heapless::Vec as BoundedVec;
use serde::Serialize;

use crate::clock::{WeekTime, Weekday, validate_slot_time};
use crate::config::{MAX_PLANNING_COUNT, MAX_PLANNING_SLOT_COUNT};
use crate::error::{Error, StorageError, ValidationError};
use crate::orders::OrderId;
use crate::zones::{Description, PlanningId};

/// Slot ids are allocated per-planning, monotonically, never reused.
pub type SlotId = i32;

/// One (day, hour, minute) → order assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanningSlot {
    pub id: SlotId,
    pub dow: Weekday,
    pub hour: u8,
    pub minute: u8,
    pub order_id: OrderId,
}

impl PlanningSlot {
    /// Position on the weekly ring; slots always sit on a whole minute.
    pub fn week_offset_secs(&self) -> u32 {
        u32::from(self.dow.as_u8()) * crate::clock::SECS_PER_DAY
            + u32::from(self.hour) * 3600
            + u32::from(self.minute) * 60
    }

    /// Whether this slot occupies the protected Sunday-00:00 position.
    pub fn is_anchor(&self) -> bool {
        self.dow == Weekday::Sunday && self.hour == 0 && self.minute == 0
    }

    /// Encode into the persisted record string `"dow:hour:minute:order"`.
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.dow.as_u8(),
            self.hour,
            self.minute,
            self.order_id.as_u8()
        )
    }

    /// Parse a persisted record; the slot id comes from the store key.
    pub fn decode(id: SlotId, record: &str) -> Result<Self, Error> {
        let mut fields = record.split(':');
        let (Some(dow), Some(hour), Some(minute), Some(order), None) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        ) else {
            return Err(StorageError::Corrupted.into());
        };
        let parse = |s: &str| s.parse::<u8>().map_err(|_| StorageError::Corrupted);
        let (dow, hour, minute) = (parse(dow)?, parse(hour)?, parse(minute)?);
        let dow = validate_slot_time(dow, hour, minute).map_err(|_| StorageError::Corrupted)?;
        let order_id = parse(order)
            .ok()
            .and_then(OrderId::from_u8)
            .ok_or(StorageError::Corrupted)?;
        Ok(Self {
            id,
            dow,
            hour,
            minute,
            order_id,
        })
    }
}

/// Partial update for [`PlanningSlot`]; absent fields keep their value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotPatch {
    pub dow: Option<u8>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub order_id: Option<OrderId>,
}

/// A named weekly schedule.
#[derive(Debug, Clone, Serialize)]
pub struct Planning {
    pub id: PlanningId,
    pub description: Description,
    /// Highest slot id ever allocated in this planning (watermark).
    max_slot_id: SlotId,
    slots: BoundedVec<PlanningSlot, MAX_PLANNING_SLOT_COUNT>,
}

impl Planning {
    pub fn new(id: PlanningId, description: Description) -> Self {
        Self {
            id,
            description,
            max_slot_id: -1,
            slots: BoundedVec::new(),
        }
    }

    pub fn slots(&self) -> &[PlanningSlot] {
        &self.slots
    }

    pub fn find_slot(&self, slot_id: SlotId) -> Option<&PlanningSlot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }

    /// Next id the allocator would hand out. Ids advance even across
    /// removals, so a deleted slot's id is never reissued.
    pub fn next_slot_id(&self) -> SlotId {
        self.max_slot_id + 1
    }

    fn occupied(&self, dow: Weekday, hour: u8, minute: u8, excluding: Option<SlotId>) -> bool {
        self.slots.iter().any(|s| {
            Some(s.id) != excluding && s.dow == dow && s.hour == hour && s.minute == minute
        })
    }

    /// Validate a new slot at (dow, hour, minute) and build it with the
    /// next allocated id. Does not insert — the caller persists first.
    pub fn prepare_slot(
        &self,
        dow: u8,
        hour: u8,
        minute: u8,
        order_id: OrderId,
    ) -> Result<PlanningSlot, Error> {
        let dow = validate_slot_time(dow, hour, minute)?;
        if self.slots.is_full() {
            return Err(ValidationError::CapacityExhausted.into());
        }
        if self.occupied(dow, hour, minute, None) {
            return Err(ValidationError::DuplicateSlot.into());
        }
        Ok(PlanningSlot {
            id: self.next_slot_id(),
            dow,
            hour,
            minute,
            order_id,
        })
    }

    /// Insert a slot prepared by [`prepare_slot`] (or loaded from the
    /// store) and advance the id watermark.
    pub fn insert_slot(&mut self, slot: PlanningSlot) -> Result<(), Error> {
        self.slots
            .push(slot)
            .map_err(|_| ValidationError::CapacityExhausted)?;
        self.max_slot_id = self.max_slot_id.max(slot.id);
        Ok(())
    }

    /// Validate a removal. The anchor slot is refused unconditionally.
    pub fn check_remove_slot(&self, slot_id: SlotId) -> Result<&PlanningSlot, Error> {
        let slot = self
            .find_slot(slot_id)
            .ok_or(ValidationError::UnknownSlot)?;
        if slot.is_anchor() {
            return Err(ValidationError::AnchorSlotProtected.into());
        }
        Ok(slot)
    }

    /// Remove after [`check_remove_slot`] succeeded (id must exist).
    pub fn remove_slot(&mut self, slot_id: SlotId) {
        if let Some(pos) = self.slots.iter().position(|s| s.id == slot_id) {
            self.slots.swap_remove(pos);
        }
    }

    /// Build the slot as it would look after `patch`, refusing changes
    /// that would relocate the anchor or collide with another slot.
    /// Nothing is mutated; the caller persists then calls
    /// [`replace_slot`].
    pub fn prepare_patch(&self, slot_id: SlotId, patch: &SlotPatch) -> Result<PlanningSlot, Error> {
        let slot = self
            .find_slot(slot_id)
            .ok_or(ValidationError::UnknownSlot)?;

        let dow = patch.dow.unwrap_or(slot.dow.as_u8());
        let hour = patch.hour.unwrap_or(slot.hour);
        let minute = patch.minute.unwrap_or(slot.minute);
        let dow = validate_slot_time(dow, hour, minute)?;

        let moved = (dow, hour, minute) != (slot.dow, slot.hour, slot.minute);
        if moved {
            if slot.is_anchor() {
                return Err(ValidationError::AnchorSlotProtected.into());
            }
            if self.occupied(dow, hour, minute, Some(slot_id)) {
                return Err(ValidationError::DuplicateSlot.into());
            }
        }

        Ok(PlanningSlot {
            id: slot.id,
            dow,
            hour,
            minute,
            order_id: patch.order_id.unwrap_or(slot.order_id),
        })
    }

    /// Apply a patched slot prepared by [`prepare_patch`] in one step.
    pub fn replace_slot(&mut self, patched: PlanningSlot) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == patched.id) {
            *slot = patched;
        }
    }

    /// The most recent slot at or before `now` on the weekly ring.
    ///
    /// Linear scan over the bounded slot arena: a slot is eligible iff
    /// its weekly offset does not exceed now's, and the minimal delta
    /// wins. The no-duplicate invariant makes ties impossible, and the
    /// anchor guarantees a candidate — `None` therefore signals a
    /// corrupted (emptied) planning, which the caller degrades.
    pub fn resolve(&self, now: &WeekTime) -> Option<OrderId> {
        let current = now.week_offset_secs();
        self.slots
            .iter()
            .filter(|s| s.week_offset_secs() <= current)
            .min_by_key(|s| current - s.week_offset_secs())
            .map(|s| s.order_id)
    }
}

/// All plannings, a dense arena looked up by stable id.
#[derive(Debug, Default, Serialize)]
pub struct PlanningList {
    /// Highest planning id ever allocated (watermark, never reissued).
    max_id: PlanningId,
    plannings: Vec<Planning>,
}

impl PlanningList {
    pub fn new() -> Self {
        Self {
            max_id: -1,
            plannings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.plannings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plannings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Planning> {
        self.plannings.iter()
    }

    pub fn find(&self, id: PlanningId) -> Option<&Planning> {
        self.plannings.iter().find(|p| p.id == id)
    }

    pub fn find_mut(&mut self, id: PlanningId) -> Option<&mut Planning> {
        self.plannings.iter_mut().find(|p| p.id == id)
    }

    pub fn find_by_description(&self, description: &str) -> Option<&Planning> {
        self.plannings
            .iter()
            .find(|p| p.description.as_str() == description)
    }

    /// Next id the allocator would hand out.
    pub fn next_id(&self) -> PlanningId {
        self.max_id + 1
    }

    /// Insert a planning (freshly created or loaded from the store) and
    /// advance the id watermark.
    pub fn insert(&mut self, planning: Planning) -> Result<(), Error> {
        if self.plannings.len() >= MAX_PLANNING_COUNT {
            return Err(ValidationError::CapacityExhausted.into());
        }
        self.max_id = self.max_id.max(planning.id);
        self.plannings.push(planning);
        Ok(())
    }

    pub fn remove(&mut self, id: PlanningId) -> Option<Planning> {
        let pos = self.plannings.iter().position(|p| p.id == id)?;
        Some(self.plannings.swap_remove(pos))
    }
}
