//! Task Watchdog Timer (TWDT) driver.
//!
//! The tick loop must call [`Watchdog::feed`] every iteration; if
//! resolution or a store commit wedges for longer than the timeout the
//! device resets rather than leaving heaters stuck on a stale order.

/// Watchdog timeout. The loop ticks once a second; anything stalled for
/// half a minute is not coming back.
const TIMEOUT_MS: u32 = 30_000;

pub struct Watchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        use esp_idf_svc::sys::{
            ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
        };

        // SAFETY: called once from the main task before the loop starts.
        let subscribed = unsafe {
            let cfg = esp_task_wdt_config_t {
                timeout_ms: TIMEOUT_MS,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = esp_task_wdt_reconfigure(&cfg);
            if ret != ESP_OK {
                log::warn!("watchdog reconfigure returned {ret} (may already be configured)");
            }
            esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK
        };
        if subscribed {
            log::info!("watchdog armed ({} s timeout)", TIMEOUT_MS / 1000);
        } else {
            log::warn!("watchdog subscription failed, running unprotected");
        }
        Self { subscribed }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {}
    }

    /// Reset the timeout. Call once per tick.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: only resets the current task's TWDT entry.
            unsafe {
                esp_idf_svc::sys::esp_task_wdt_reset();
            }
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}
