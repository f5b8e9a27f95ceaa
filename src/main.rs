//! Pilotwire firmware — main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │   NvsStore          LocalClock        LogEventSink            │
//! │   (StoragePort)     (wall clock)      (EventSink)             │
//! │   Esp32Hardware     M1E1Hardware                              │
//! │   (HardwareDriver)  (HardwareDriver + 74HC595 chain)          │
//! │                                                               │
//! │   ────────────── Port Trait Boundary ───────────────          │
//! │                                                               │
//! │   ┌───────────────────────────────────────────────────┐       │
//! │   │        Controller (configuration engine)          │       │
//! │   │  orders · zones · plannings · override            │       │
//! │   └───────────────────────────────────────────────────┘       │
//! │                                                               │
//! │   1 Hz tick: resolve_all → apply → feed watchdog              │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Network bring-up (WiFi, the HTTPS configuration API, mDNS and the
//! SNTP service) attaches to the shared controller handle from outside
//! this core; until the wall clock synchronises, ticks idle.
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::info;

use pilotwire::adapters::clock::LocalClock;
use pilotwire::adapters::log_sink::LogEventSink;
use pilotwire::adapters::nvs::NvsStore;
use pilotwire::app::service::{Controller, SharedController};
use pilotwire::config::TICK_PERIOD_MS;
use pilotwire::drivers::watchdog::Watchdog;
use pilotwire::hw::esp32::Esp32Hardware;
use pilotwire::hw::m1e1::M1E1Hardware;
use pilotwire::hw::HardwareRegistry;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("pilotwire v{}", env!("CARGO_PKG_VERSION"));

    // Metropolitan France; localtime_r follows this rule for DST.
    // SAFETY: set before any thread reads the environment.
    unsafe {
        std::env::set_var("TZ", "CET-1CEST,M3.5.0/2,M10.5.0/3");
    }

    // ── 2. Storage ────────────────────────────────────────────
    let store = NvsStore::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;

    // ── 3. Register every hardware available in this image ────
    // Registration order is fixed at startup; overflowing the registry
    // is a firmware-image bug and aborts boot.
    let mut registry = HardwareRegistry::new();
    registry
        .register(Box::new(Esp32Hardware::new()))
        .context("registering ESP32")?;
    registry
        .register(Box::new(M1E1Hardware::new()))
        .context("registering M1E1")?;

    // ── 4. Boot the configuration engine ──────────────────────
    let mut sink = LogEventSink::new();
    let mut controller = Controller::new(store, registry);
    controller.boot(&mut sink);

    // One exclusive lock scopes the whole configuration model; the
    // API handlers clone this handle and serialise against the tick.
    let controller: SharedController<NvsStore> = Arc::new(Mutex::new(controller));

    // ── 5. Tick loop ──────────────────────────────────────────
    let clock = LocalClock::new();
    let watchdog = Watchdog::new();
    let mut clock_synced = false;

    info!("entering tick loop ({TICK_PERIOD_MS} ms period)");
    loop {
        if let Some(now) = clock.now() {
            if !clock_synced {
                info!("wall clock synchronised, resolution active");
                clock_synced = true;
            }
            let mut ctl = match controller.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            ctl.tick(&now, &mut sink);
        }

        watchdog.feed();
        std::thread::sleep(Duration::from_millis(u64::from(TICK_PERIOD_MS)));
    }
}
