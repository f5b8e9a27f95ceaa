//! The configuration service — single owned context for the whole model.
//!
//! [`Controller`] owns the hardware registry, the active zone set, the
//! planning list, the override singleton and the storage port. Every
//! configuration mutation and the periodic resolution pass go through
//! `&mut self`, so wrapping one controller in a mutex (see
//! [`SharedController`]) serialises the API tasks against the tick task
//! and no reader can observe a torn update.
//!
//! Mutation discipline: validate first, persist second, mutate memory
//! last. A failed persist surfaces as `Err` with the in-memory model
//! unchanged. The one multi-record operation (planning deletion) removes
//! storage before memory and logs, rather than fails, on partial cascade
//! persists — memory stays consistent either way.

use log::{info, warn};

use crate::clock::WeekTime;
use crate::error::{Result, ValidationError};
use crate::hw::{self, HardwareRegistry, ParamValue};
use crate::orders::{DEFAULT_ORDER, OrderId};
use crate::planning::{Planning, PlanningList, PlanningSlot, SlotId, SlotPatch};
use crate::zones::{Description, Override, PlanningId, Zone, ZoneMode, ZoneSet};

use super::events::AppEvent;
use super::ports::{EventSink, StoragePort};

// ── Persistence namespace layout ──────────────────────────────
//
// NVS namespaces and keys are capped at 15 characters; identifiers
// embedded in names are clipped to that bound (every registered
// hardware id fits without clipping).

/// Root namespace: selected hardware id and the override record.
const NS_ROOT: &str = "pilotwire";
const KEY_HARDWARE: &str = "hardware";
const KEY_OVERRIDE: &str = "override";

/// Planning registry: key = planning id (decimal), value = description.
const NS_PLANNINGS: &str = "plans";

/// Override record value when no forcing is active.
const OVERRIDE_NONE: &str = "none";

fn store_name(prefix: &str, id: &str) -> String {
    let mut name = format!("{prefix}{id}");
    name.truncate(crate::config::MAX_LEN_STORE_NAME);
    name
}

/// Per-hardware parameter namespace.
fn ns_hardware(hw_id: &str) -> String {
    store_name("hw_", hw_id)
}

/// Per-hardware zone-record namespace.
fn ns_zones(hw_id: &str) -> String {
    store_name("zn_", hw_id)
}

/// Per-planning slot namespace: key = slot id (decimal), value = record.
fn ns_planning_slots(planning_id: PlanningId) -> String {
    format!("plan_{planning_id}")
}

// ── Controller ────────────────────────────────────────────────

struct ActiveHardware {
    /// Index into the registry (stable: the registry is append-only).
    index: usize,
    zones: ZoneSet,
}

/// The single owned configuration context.
pub struct Controller<S: StoragePort> {
    store: S,
    registry: HardwareRegistry,
    active: Option<ActiveHardware>,
    plannings: PlanningList,
    override_state: Override,
}

/// Process-wide sharing handle: one exclusive lock scopes the whole
/// configuration model, covering API mutations and the tick alike.
pub type SharedController<S> = std::sync::Arc<std::sync::Mutex<Controller<S>>>;

impl<S: StoragePort> Controller<S> {
    pub fn new(store: S, registry: HardwareRegistry) -> Self {
        Self {
            store,
            registry,
            active: None,
            plannings: PlanningList::new(),
            override_state: Override::default(),
        }
    }

    // ── Boot ──────────────────────────────────────────────────

    /// Load the persisted configuration and bring up the selected
    /// hardware. Corrupt or missing records degrade to defaults with a
    /// warning; boot itself never fails.
    pub fn boot(&mut self, sink: &mut impl EventSink) {
        self.load_override();
        self.load_plannings();
        self.initialize_hardware(sink);
    }

    fn load_override(&mut self) {
        match self.store.get_str(NS_ROOT, KEY_OVERRIDE) {
            None => {}
            Some(v) if v == OVERRIDE_NONE => {}
            Some(v) => match OrderId::from_str_id(&v) {
                Some(order) => {
                    info!("override restored: {}", order.info().id);
                    self.override_state.enable(order);
                }
                None => warn!("stored override {v:?} unknown, override stays off"),
            },
        }
    }

    fn load_plannings(&mut self) {
        for key in self.store.keys(NS_PLANNINGS) {
            let Ok(id) = key.parse::<PlanningId>() else {
                warn!("planning key {key:?} is not an id, skipping");
                continue;
            };
            let Some(raw) = self.store.get_str(NS_PLANNINGS, &key) else {
                continue;
            };
            let Ok(description) = Description::try_from(raw.as_str()) else {
                warn!("planning {id}: stored description too long, skipping");
                continue;
            };
            if id < 0 || self.plannings.find_by_description(&description).is_some() {
                warn!("planning {id}: invalid or duplicate record, skipping");
                continue;
            }

            let mut planning = Planning::new(id, description);
            let slots_ns = ns_planning_slots(id);
            for slot_key in self.store.keys(&slots_ns) {
                let Ok(slot_id) = slot_key.parse::<SlotId>() else {
                    warn!("planning {id}: slot key {slot_key:?} is not an id, skipping");
                    continue;
                };
                let Some(record) = self.store.get_str(&slots_ns, &slot_key) else {
                    continue;
                };
                match PlanningSlot::decode(slot_id, &record) {
                    Ok(slot) => {
                        if planning.insert_slot(slot).is_err() {
                            warn!("planning {id}: slot arena full, ignoring slot {slot_id}");
                        }
                    }
                    Err(_) => warn!("planning {id}: slot {slot_id} record corrupt, skipping"),
                }
            }

            // Storage corruption may have eaten the anchor; restore it so
            // resolution keeps its guaranteed candidate.
            if !planning.slots().iter().any(PlanningSlot::is_anchor) {
                warn!("planning {id}: anchor slot missing, recreating");
                if let Ok(anchor) = planning.prepare_slot(0, 0, 0, DEFAULT_ORDER) {
                    if let Err(e) =
                        self.store
                            .set_str(&slots_ns, &anchor.id.to_string(), &anchor.encode())
                    {
                        warn!("planning {id}: anchor not persisted: {e}");
                    }
                    let _ = planning.insert_slot(anchor);
                }
            }

            if self.plannings.insert(planning).is_err() {
                warn!("planning list full, ignoring planning {id}");
            }
        }
        info!("loaded {} plannings", self.plannings.len());
    }

    fn initialize_hardware(&mut self, sink: &mut impl EventSink) {
        let Some(hw_id) = self.store.get_str(NS_ROOT, KEY_HARDWARE) else {
            info!("no hardware selected, controller stays idle");
            sink.emit(&AppEvent::HardwareDisabled {
                reason: "no hardware selected",
            });
            return;
        };
        let Some(index) = self.registry.index_of(&hw_id) else {
            warn!("selected hardware {hw_id:?} is not registered, controller stays idle");
            sink.emit(&AppEvent::HardwareDisabled {
                reason: "unknown hardware id",
            });
            return;
        };

        self.load_hardware_params(index);

        let Some(driver) = self.registry.get_mut(index) else {
            return;
        };
        let driver_id = driver.id();
        let mut zones = match driver.init() {
            Ok(zones) => zones,
            Err(e) => {
                warn!("hardware {driver_id} init failed ({e}), controller stays idle");
                sink.emit(&AppEvent::HardwareDisabled {
                    reason: "hardware init failed",
                });
                return;
            }
        };

        let ns = ns_zones(driver_id);
        for zone in zones.iter_mut() {
            match self.store.get_str(&ns, zone.id.as_str()) {
                Some(record) => match ZoneMode::decode(&record) {
                    Ok((mode, description)) => {
                        zone.mode = mode;
                        zone.description = description;
                    }
                    Err(_) => {
                        warn!("zone {}: stored record corrupt, using defaults", zone.id);
                    }
                },
                None => warn!("zone {}: no stored record, using defaults", zone.id),
            }
        }

        info!("hardware {driver_id} ready with {} zones", zones.len());
        sink.emit(&AppEvent::HardwareReady {
            id: driver_id,
            zones: zones.len(),
        });
        self.active = Some(ActiveHardware { index, zones });
    }

    fn load_hardware_params(&mut self, index: usize) {
        let Some(driver) = self.registry.get_mut(index) else {
            return;
        };
        let ns = ns_hardware(driver.id());
        for param in driver.params_mut() {
            // Absent or unreadable values keep the compiled-in default,
            // so an unconfigured board still boots usable.
            match &mut param.value {
                ParamValue::Integer(v) => {
                    if let Some(stored) = self.store.get_i32(&ns, param.id) {
                        *v = stored;
                    }
                }
                ParamValue::Text(v) => {
                    if let Some(stored) = self.store.get_str(&ns, param.id) {
                        match heapless::String::try_from(stored.as_str()) {
                            Ok(s) => *v = s,
                            Err(()) => {
                                warn!("parameter {}: stored value too long, keeping default", param.id);
                            }
                        }
                    }
                }
            }
        }
    }

    // ── Tick ──────────────────────────────────────────────────

    /// Recompute every zone's current order for `now`.
    ///
    /// Pure given the configuration snapshot and the clock instant:
    /// calling it twice with the same inputs changes nothing the second
    /// time. A zone whose planning cannot resolve degrades to the
    /// default order; one bad zone never aborts the pass.
    pub fn resolve_all(&mut self, now: &WeekTime, sink: &mut impl EventSink) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let masked = self.override_state.get();
        for zone in active.zones.iter_mut() {
            let next = match (masked, zone.mode) {
                (Some(order), _) => order,
                (None, ZoneMode::Fixed(order)) => order,
                (None, ZoneMode::Planning(planning_id)) => {
                    match self
                        .plannings
                        .find(planning_id)
                        .and_then(|p| p.resolve(now))
                    {
                        Some(order) => order,
                        None => {
                            warn!(
                                "zone {}: planning {planning_id} did not resolve, using default order",
                                zone.id
                            );
                            DEFAULT_ORDER
                        }
                    }
                }
            };
            if next != zone.current {
                sink.emit(&AppEvent::ZoneOrderChanged {
                    zone: zone.id.clone(),
                    from: zone.current,
                    to: next,
                });
                zone.current = next;
            }
        }
    }

    /// One full periodic cycle: resolve, then push orders to the board.
    pub fn tick(&mut self, now: &WeekTime, sink: &mut impl EventSink) {
        self.resolve_all(now, sink);
        let Some(active) = self.active.as_ref() else {
            return;
        };
        let zones = &active.zones;
        let Some(driver) = self.registry.get_mut(active.index) else {
            return;
        };
        if let Err(e) = driver.apply(zones, now) {
            warn!("hardware apply failed: {e}");
        }
    }

    // ── Zone configuration ────────────────────────────────────
    //
    // Mode and description setters mutate memory only; the explicit
    // `zone_store` persists, so an API handler editing description and
    // mode together commits once.

    pub fn zone_set_mode_fixed(&mut self, zone_id: &str, order: OrderId) -> Result<()> {
        let zone = self.active_zone_mut(zone_id)?;
        zone.mode = ZoneMode::Fixed(order);
        Ok(())
    }

    pub fn zone_set_mode_planning(&mut self, zone_id: &str, planning_id: PlanningId) -> Result<()> {
        if self.plannings.find(planning_id).is_none() {
            return Err(ValidationError::UnknownPlanning.into());
        }
        let zone = self.active_zone_mut(zone_id)?;
        zone.mode = ZoneMode::Planning(planning_id);
        Ok(())
    }

    pub fn zone_set_description(&mut self, zone_id: &str, text: &str) -> Result<()> {
        let description = Description::try_from(text).map_err(|()| ValidationError::TextTooLong)?;
        let zone = self.active_zone_mut(zone_id)?;
        zone.description = description;
        Ok(())
    }

    /// Persist a zone's record.
    pub fn zone_store(&mut self, zone_id: &str) -> Result<()> {
        let Some(active) = self.active.as_ref() else {
            return Err(ValidationError::UnknownZone.into());
        };
        let zone = active
            .zones
            .find(zone_id)
            .ok_or(ValidationError::UnknownZone)?;
        let hw_id = self
            .registry
            .get(active.index)
            .map(super::ports::HardwareDriver::id)
            .unwrap_or_default();
        let record = zone.mode.encode(&zone.description);
        self.store
            .set_str(&ns_zones(hw_id), zone.id.as_str(), &record)?;
        Ok(())
    }

    fn active_zone_mut(&mut self, zone_id: &str) -> Result<&mut Zone> {
        self.active
            .as_mut()
            .and_then(|a| a.zones.find_mut(zone_id))
            .ok_or_else(|| ValidationError::UnknownZone.into())
    }

    // ── Planning configuration ────────────────────────────────

    /// Create a planning with its anchor slot, persisting both. If the
    /// anchor record cannot be written the planning record is rolled
    /// back and the list is unchanged.
    pub fn planning_create(&mut self, description: &str) -> Result<PlanningId> {
        let description =
            Description::try_from(description).map_err(|()| ValidationError::TextTooLong)?;
        if self.plannings.find_by_description(&description).is_some() {
            return Err(ValidationError::DuplicateDescription.into());
        }
        if self.plannings.len() >= crate::config::MAX_PLANNING_COUNT {
            return Err(ValidationError::CapacityExhausted.into());
        }

        let id = self.plannings.next_id();
        self.store
            .set_str(NS_PLANNINGS, &id.to_string(), &description)?;

        let mut planning = Planning::new(id, description);
        let anchor = planning.prepare_slot(0, 0, 0, DEFAULT_ORDER)?;
        if let Err(e) =
            self.store
                .set_str(&ns_planning_slots(id), &anchor.id.to_string(), &anchor.encode())
        {
            if self.store.delete(NS_PLANNINGS, &id.to_string()).is_err() {
                warn!("planning {id}: rollback of registry record failed");
            }
            return Err(e.into());
        }
        planning.insert_slot(anchor)?;
        self.plannings.insert(planning)?;
        info!("planning {id} created");
        Ok(id)
    }

    pub fn planning_rename(&mut self, id: PlanningId, description: &str) -> Result<()> {
        let description =
            Description::try_from(description).map_err(|()| ValidationError::TextTooLong)?;
        if self.plannings.find(id).is_none() {
            return Err(ValidationError::UnknownPlanning.into());
        }
        if let Some(other) = self.plannings.find_by_description(&description) {
            if other.id != id {
                return Err(ValidationError::DuplicateDescription.into());
            }
        }
        self.store
            .set_str(NS_PLANNINGS, &id.to_string(), &description)?;
        if let Some(planning) = self.plannings.find_mut(id) {
            planning.description = description;
        }
        Ok(())
    }

    /// Delete a planning: purge its slots and registry record from
    /// storage, drop it from memory, then reset every zone that
    /// referenced it to Fixed + default order (each reset persisted).
    pub fn planning_delete(&mut self, id: PlanningId, sink: &mut impl EventSink) -> Result<()> {
        if self.plannings.find(id).is_none() {
            return Err(ValidationError::UnknownPlanning.into());
        }
        self.store.clear(&ns_planning_slots(id))?;
        self.store.delete(NS_PLANNINGS, &id.to_string())?;
        self.plannings.remove(id);
        sink.emit(&AppEvent::PlanningRemoved { id });
        info!("planning {id} deleted");

        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        let hw_id = self
            .registry
            .get(active.index)
            .map(super::ports::HardwareDriver::id)
            .unwrap_or_default();
        let ns = ns_zones(hw_id);
        for zone in active.zones.iter_mut() {
            if zone.mode == ZoneMode::Planning(id) {
                zone.mode = ZoneMode::Fixed(DEFAULT_ORDER);
                let record = zone.mode.encode(&zone.description);
                if let Err(e) = self.store.set_str(&ns, zone.id.as_str(), &record) {
                    warn!("zone {}: reset after planning delete not persisted: {e}", zone.id);
                }
            }
        }
        Ok(())
    }

    pub fn slot_add(
        &mut self,
        planning_id: PlanningId,
        dow: u8,
        hour: u8,
        minute: u8,
        order_id: OrderId,
    ) -> Result<SlotId> {
        let planning = self
            .plannings
            .find(planning_id)
            .ok_or(ValidationError::UnknownPlanning)?;
        let slot = planning.prepare_slot(dow, hour, minute, order_id)?;
        self.store.set_str(
            &ns_planning_slots(planning_id),
            &slot.id.to_string(),
            &slot.encode(),
        )?;
        if let Some(planning) = self.plannings.find_mut(planning_id) {
            planning.insert_slot(slot)?;
        }
        Ok(slot.id)
    }

    pub fn slot_remove(&mut self, planning_id: PlanningId, slot_id: SlotId) -> Result<()> {
        let planning = self
            .plannings
            .find(planning_id)
            .ok_or(ValidationError::UnknownPlanning)?;
        planning.check_remove_slot(slot_id)?;
        self.store
            .delete(&ns_planning_slots(planning_id), &slot_id.to_string())?;
        if let Some(planning) = self.plannings.find_mut(planning_id) {
            planning.remove_slot(slot_id);
        }
        Ok(())
    }

    /// Patch a slot. Every provided field is optional; the change is
    /// validated as a whole and applied as one in-memory update and one
    /// persisted record, or not at all.
    pub fn slot_update(
        &mut self,
        planning_id: PlanningId,
        slot_id: SlotId,
        patch: &SlotPatch,
    ) -> Result<()> {
        let planning = self
            .plannings
            .find(planning_id)
            .ok_or(ValidationError::UnknownPlanning)?;
        let patched = planning.prepare_patch(slot_id, patch)?;
        self.store.set_str(
            &ns_planning_slots(planning_id),
            &patched.id.to_string(),
            &patched.encode(),
        )?;
        if let Some(planning) = self.plannings.find_mut(planning_id) {
            planning.replace_slot(patched);
        }
        Ok(())
    }

    // ── Override ──────────────────────────────────────────────

    /// Force every zone to `order` from the next tick on. Persistence
    /// is the separate [`override_store`](Self::override_store) call so
    /// handlers can batch mutate + persist.
    pub fn override_enable(&mut self, order: OrderId, sink: &mut impl EventSink) {
        self.override_state.enable(order);
        sink.emit(&AppEvent::OverrideChanged { order: Some(order) });
    }

    pub fn override_disable(&mut self, sink: &mut impl EventSink) {
        self.override_state.disable();
        sink.emit(&AppEvent::OverrideChanged { order: None });
    }

    pub fn override_get(&self) -> Option<OrderId> {
        self.override_state.get()
    }

    pub fn override_store(&mut self) -> Result<()> {
        let value = match self.override_state.get() {
            Some(order) => order.info().id,
            None => OVERRIDE_NONE,
        };
        self.store.set_str(NS_ROOT, KEY_OVERRIDE, value)?;
        Ok(())
    }

    // ── Hardware configuration ────────────────────────────────

    /// Persist the hardware selection; it takes effect at next boot,
    /// matching the original controller's reboot-to-switch behaviour.
    pub fn select_hardware(&mut self, hw_id: &str) -> Result<()> {
        if self.registry.find(hw_id).is_none() {
            return Err(ValidationError::UnknownHardware.into());
        }
        self.store.set_str(NS_ROOT, KEY_HARDWARE, hw_id)?;
        Ok(())
    }

    pub fn set_param_i32(&mut self, hw_id: &str, param_id: &str, value: i32) -> Result<()> {
        let driver = self
            .registry
            .find_mut(hw_id)
            .ok_or(ValidationError::UnknownHardware)?;
        let param =
            hw::find_param_mut(driver, param_id).ok_or(ValidationError::UnknownParameter)?;
        param.set_i32(value)
    }

    pub fn set_param_text(&mut self, hw_id: &str, param_id: &str, value: &str) -> Result<()> {
        let driver = self
            .registry
            .find_mut(hw_id)
            .ok_or(ValidationError::UnknownHardware)?;
        let param =
            hw::find_param_mut(driver, param_id).ok_or(ValidationError::UnknownParameter)?;
        param.set_text(value)
    }

    /// Persist every parameter of a hardware definition (batched like
    /// zone records: edit freely, then store once).
    pub fn store_hardware_params(&mut self, hw_id: &str) -> Result<()> {
        let driver = self
            .registry
            .find(hw_id)
            .ok_or(ValidationError::UnknownHardware)?;
        let ns = ns_hardware(driver.id());
        for param in driver.params() {
            match &param.value {
                ParamValue::Integer(v) => self.store.set_i32(&ns, param.id, *v)?,
                ParamValue::Text(v) => self.store.set_str(&ns, param.id, v)?,
            }
        }
        Ok(())
    }

    // ── Snapshots for the API layer ───────────────────────────

    pub fn registry(&self) -> &HardwareRegistry {
        &self.registry
    }

    /// Id of the initialised hardware, `None` while idle.
    pub fn current_hardware(&self) -> Option<&'static str> {
        let active = self.active.as_ref()?;
        self.registry
            .get(active.index)
            .map(super::ports::HardwareDriver::id)
    }

    /// Zones of the active hardware (empty while idle).
    pub fn zones(&self) -> &[Zone] {
        self.active.as_ref().map_or(&[], |a| a.zones.as_slice())
    }

    pub fn plannings(&self) -> &PlanningList {
        &self.plannings
    }
}
