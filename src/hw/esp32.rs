//! Debug hardware: any bare ESP32 devkit.
//!
//! Lets the firmware run without dedicated electronics — four virtual
//! zones whose computed signals only reach the log. Also serves as the
//! reference for writing a new variant, which is why it declares one
//! parameter of each type.

use log::{debug, info};

use crate::app::ports::HardwareDriver;
use crate::clock::WeekTime;
use crate::error::Result;
use crate::hw::HwParam;
use crate::zones::ZoneSet;

const ZONE_COUNT: usize = 4;

pub struct Esp32Hardware {
    params: [HwParam; 2],
}

impl Esp32Hardware {
    pub fn new() -> Self {
        Self {
            params: [
                HwParam::text("sample_param", "a parameter of type string", "foo"),
                HwParam::integer("another_param", "a parameter of type integer", 42),
            ],
        }
    }
}

impl Default for Esp32Hardware {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareDriver for Esp32Hardware {
    fn id(&self) -> &'static str {
        "ESP32"
    }

    fn description(&self) -> &'static str {
        "Any ESP32 devkit, to target a new hardware or debug without dedicated electronics"
    }

    fn params(&self) -> &[HwParam] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [HwParam] {
        &mut self.params
    }

    fn init(&mut self) -> Result<ZoneSet> {
        let mut zones = ZoneSet::new();
        for n in 1..=ZONE_COUNT {
            let id = format!("z{n}");
            zones.add(&id, &id)?;
        }
        info!("ESP32 debug hardware ready, {ZONE_COUNT} virtual zones");
        Ok(zones)
    }

    fn apply(&mut self, zones: &ZoneSet, now: &WeekTime) -> Result<()> {
        for zone in zones.iter() {
            let signal = zone.current.signal(now);
            debug!(
                "zone {}: {} (+{} -{})",
                zone.id,
                zone.current.info().id,
                u8::from(signal.positive),
                u8::from(signal.negative),
            );
        }
        Ok(())
    }
}
