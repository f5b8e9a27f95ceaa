//! Week-cyclic time base for schedule resolution.
//!
//! All scheduling arithmetic happens on "seconds since the start of the
//! week" with Sunday 00:00:00 as origin, matching the `tm_wday`
//! convention of the C library the persisted records were written
//! against. Day-of-week numbering must therefore never change.

use serde::Serialize;

use crate::error::{Error, ValidationError};

/// Seconds in one day.
pub const SECS_PER_DAY: u32 = 86_400;

/// Seconds in one week, the period of the scheduling ring.
pub const SECS_PER_WEEK: u32 = 7 * SECS_PER_DAY;

/// Day of week, Sunday-first (`tm_wday` numbering — frozen, persisted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum Weekday {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl Weekday {
    pub const COUNT: usize = 7;

    /// All days in persisted numeric order.
    pub const ALL: [Weekday; Self::COUNT] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn from_u8(n: u8) -> Option<Self> {
        Self::ALL.get(n as usize).copied()
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "sunday",
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
        }
    }
}

/// A wall-clock instant reduced to its position within the week.
///
/// This is the only time representation the resolution engine sees; the
/// tick source decomposes local time (post-SNTP) into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekTime {
    pub dow: Weekday,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl WeekTime {
    pub fn new(dow: Weekday, hour: u8, minute: u8, second: u8) -> Result<Self, Error> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(ValidationError::TimeOutOfRange.into());
        }
        Ok(Self {
            dow,
            hour,
            minute,
            second,
        })
    }

    /// Seconds elapsed since Sunday 00:00:00.
    pub fn week_offset_secs(&self) -> u32 {
        u32::from(self.dow.as_u8()) * SECS_PER_DAY
            + u32::from(self.hour) * 3600
            + u32::from(self.minute) * 60
            + u32::from(self.second)
    }
}

/// Validate the (dow, hour, minute) triple of a planning slot.
pub fn validate_slot_time(dow: u8, hour: u8, minute: u8) -> Result<Weekday, Error> {
    let dow = Weekday::from_u8(dow).ok_or(ValidationError::TimeOutOfRange)?;
    if hour > 23 || minute > 59 {
        return Err(ValidationError::TimeOutOfRange.into());
    }
    Ok(dow)
}
