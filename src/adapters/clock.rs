//! Local wall-clock adapter.
//!
//! Resolution needs local time decomposed into day-of-week / hour /
//! minute / second. On target this comes from the C library's
//! `localtime_r` over `gettimeofday`, which is only meaningful once
//! SNTP has synchronised the clock — until then [`LocalClock::now`]
//! returns `None` and the tick loop idles.

use crate::clock::{WeekTime, Weekday};

pub struct LocalClock;

impl LocalClock {
    pub fn new() -> Self {
        Self
    }

    /// Current local time within the week, or `None` while the wall
    /// clock is not yet trustworthy.
    #[cfg(target_os = "espidf")]
    pub fn now(&self) -> Option<WeekTime> {
        use esp_idf_svc::sys::{gettimeofday, localtime_r, time_t, timeval, tm};

        let mut tv = timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        // SAFETY: plain libc calls on stack-owned out-parameters.
        if unsafe { gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        // Reject obviously unsynced time (before 2020-01-01).
        const EPOCH_2020: i64 = 1_577_836_800;
        if i64::from(tv.tv_sec) < EPOCH_2020 {
            return None;
        }

        let secs = tv.tv_sec as time_t;
        let mut decomposed: tm = unsafe { core::mem::zeroed() };
        if unsafe { localtime_r(&secs, &mut decomposed) }.is_null() {
            return None;
        }

        let dow = u8::try_from(decomposed.tm_wday).ok().and_then(Weekday::from_u8)?;
        WeekTime::new(
            dow,
            u8::try_from(decomposed.tm_hour).ok()?,
            u8::try_from(decomposed.tm_min).ok()?,
            // tm_sec may report a leap second as 60.
            u8::try_from(decomposed.tm_sec).ok()?.min(59),
        )
        .ok()
    }

    /// Host builds have no synchronised wall clock to offer.
    #[cfg(not(target_os = "espidf"))]
    pub fn now(&self) -> Option<WeekTime> {
        None
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::new()
    }
}
