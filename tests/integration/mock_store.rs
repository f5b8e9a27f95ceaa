//! Mock adapters for integration tests.
//!
//! `MemoryStore` clones share one underlying map, so a test can keep a
//! handle for seeding and assertions while the controller owns another.
//! Write-fault injection exercises the persist-first discipline.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use pilotwire::app::events::AppEvent;
use pilotwire::app::ports::{EventSink, StoragePort};
use pilotwire::app::service::Controller;
use pilotwire::error::StorageError;
use pilotwire::hw::HardwareRegistry;
use pilotwire::hw::esp32::Esp32Hardware;
use pilotwire::hw::m1e1::M1E1Hardware;

// ── MemoryStore ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I32(i32),
    Str(String),
}

#[derive(Default)]
struct Inner {
    entries: BTreeMap<String, Value>,
    /// `Some(n)`: allow `n` more writes, then fail every write.
    writes_before_failure: Option<usize>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(ns: &str, key: &str) -> String {
        format!("{ns}::{key}")
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self) {
        self.inner.borrow_mut().writes_before_failure = Some(0);
    }

    /// Allow `n` more writes to succeed, then fail the rest.
    pub fn fail_after_writes(&self, n: usize) {
        self.inner.borrow_mut().writes_before_failure = Some(n);
    }

    pub fn heal_writes(&self) {
        self.inner.borrow_mut().writes_before_failure = None;
    }

    /// Raw lookup for asserting on exactly what got persisted.
    pub fn raw(&self, ns: &str, key: &str) -> Option<Value> {
        self.inner.borrow().entries.get(&Self::key(ns, key)).cloned()
    }

    pub fn raw_str(&self, ns: &str, key: &str) -> Option<String> {
        match self.raw(ns, key) {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    fn write_allowed(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        match &mut inner.writes_before_failure {
            None => true,
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
        }
    }
}

impl StoragePort for MemoryStore {
    fn get_i32(&self, ns: &str, key: &str) -> Option<i32> {
        match self.inner.borrow().entries.get(&Self::key(ns, key)) {
            Some(Value::I32(v)) => Some(*v),
            _ => None,
        }
    }

    fn set_i32(&mut self, ns: &str, key: &str, value: i32) -> Result<(), StorageError> {
        if !self.write_allowed() {
            return Err(StorageError::Io);
        }
        self.inner
            .borrow_mut()
            .entries
            .insert(Self::key(ns, key), Value::I32(value));
        Ok(())
    }

    fn get_str(&self, ns: &str, key: &str) -> Option<String> {
        match self.inner.borrow().entries.get(&Self::key(ns, key)) {
            Some(Value::Str(v)) => Some(v.clone()),
            _ => None,
        }
    }

    fn set_str(&mut self, ns: &str, key: &str, value: &str) -> Result<(), StorageError> {
        if !self.write_allowed() {
            return Err(StorageError::Io);
        }
        self.inner
            .borrow_mut()
            .entries
            .insert(Self::key(ns, key), Value::Str(value.to_owned()));
        Ok(())
    }

    // Fault injection covers value writes only (the flash-full /
    // commit-failed class); erases are modelled as always succeeding,
    // which lets rollback paths run under injected write faults.
    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().entries.remove(&Self::key(ns, key));
        Ok(())
    }

    fn clear(&mut self, ns: &str) -> Result<(), StorageError> {
        let prefix = format!("{ns}::");
        self.inner
            .borrow_mut()
            .entries
            .retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }

    fn keys(&self, ns: &str) -> Vec<String> {
        let prefix = format!("{ns}::");
        self.inner
            .borrow()
            .entries
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(str::to_owned)
            .collect()
    }
}

// ── Event sinks ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::ZoneOrderChanged { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent) {}
}

// ── Controller construction helpers ───────────────────────────

pub fn registry() -> HardwareRegistry {
    let mut registry = HardwareRegistry::new();
    registry.register(Box::new(Esp32Hardware::new())).unwrap();
    registry.register(Box::new(M1E1Hardware::new())).unwrap();
    registry
}

/// A store pre-seeded to select M1E1 with `boards` expansion boards.
pub fn m1e1_store(boards: i32) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.set_str("pilotwire", "hardware", "M1E1").unwrap();
    store.set_i32("hw_M1E1", "e1_count", boards).unwrap();
    store
}

/// Boot a controller over the given store.
pub fn booted(store: &MemoryStore) -> Controller<MemoryStore> {
    let mut controller = Controller::new(store.clone(), registry());
    controller.boot(&mut NullSink);
    controller
}
