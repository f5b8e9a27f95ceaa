//! The heating order catalog and its pilot-wire signal encoding.
//!
//! Orders are the closed set of instructions a fil-pilote heater
//! understands. Their numeric ids are persisted inside zone and slot
//! records and must never be renumbered.

use serde::Serialize;

use crate::clock::WeekTime;
use crate::error::{Error, ValidationError};

/// A heating instruction. Numeric identity is frozen (persisted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum OrderId {
    /// Heater fully off (load shedding).
    Offload = 0,
    /// Frost protection only.
    NoFreeze = 1,
    /// Setpoint lowered by 3.5°C.
    Economy = 2,
    /// Comfort setpoint.
    Cozy = 3,
    /// Comfort lowered by 2°C (extended protocol).
    CozyMinus2 = 4,
    /// Comfort lowered by 1°C (extended protocol).
    CozyMinus1 = 5,
}

/// Order applied wherever configuration is missing, corrupt, or was
/// cascade-reset: frost protection never leaves a home unheatable in
/// winter, never heats it at full comfort either.
pub const DEFAULT_ORDER: OrderId = OrderId::NoFreeze;

impl OrderId {
    pub const COUNT: usize = 6;

    /// All orders in persisted numeric order.
    pub const ALL: [OrderId; Self::COUNT] = [
        OrderId::Offload,
        OrderId::NoFreeze,
        OrderId::Economy,
        OrderId::Cozy,
        OrderId::CozyMinus2,
        OrderId::CozyMinus1,
    ];

    pub fn from_u8(n: u8) -> Option<Self> {
        Self::ALL.get(n as usize).copied()
    }

    /// Parse a persisted decimal order id, rejecting out-of-catalog values.
    pub fn from_persisted(n: i32) -> Result<Self, Error> {
        u8::try_from(n)
            .ok()
            .and_then(Self::from_u8)
            .ok_or_else(|| ValidationError::UnknownOrder.into())
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lookup by API string id (e.g. `"cozy"`).
    pub fn from_str_id(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|o| o.info().id == s)
    }

    /// Human-facing metadata for this order.
    pub fn info(self) -> &'static OrderInfo {
        &CATALOG[self as usize]
    }

    /// Compute the two half-wave control signals for this order at `now`.
    ///
    /// The four standard orders are static encodings of which half-waves
    /// of the mains sine are let through on the pilot wire. The extended
    /// orders ride on top of Cozy: the heater sees a full wave (the
    /// Economy encoding) for the first 3 s (CozyMinus1) or 7 s
    /// (CozyMinus2) of every 5th minute and infers the -1°C / -2°C
    /// setpoint from that duty cycle. Callers must re-evaluate every
    /// tick with the same clock used for resolution.
    pub fn signal(self, now: &WeekTime) -> PilotSignal {
        match self {
            OrderId::Offload => PilotSignal::new(true, false),
            OrderId::NoFreeze => PilotSignal::new(false, true),
            OrderId::Economy => PilotSignal::new(true, true),
            OrderId::Cozy => PilotSignal::new(false, false),
            OrderId::CozyMinus1 => Self::duty_cycled(now, 3),
            OrderId::CozyMinus2 => Self::duty_cycled(now, 7),
        }
    }

    fn duty_cycled(now: &WeekTime, pulse_secs: u8) -> PilotSignal {
        if now.minute % 5 == 0 && now.second < pulse_secs {
            PilotSignal::new(true, true)
        } else {
            PilotSignal::new(false, false)
        }
    }
}

/// The two boolean half-wave gates driving one pilot wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PilotSignal {
    /// Positive half-wave let through.
    pub positive: bool,
    /// Negative half-wave let through.
    pub negative: bool,
}

impl PilotSignal {
    pub const fn new(positive: bool, negative: bool) -> Self {
        Self { positive, negative }
    }
}

/// Human-facing metadata for one order, served as-is by the HTTP API.
#[derive(Debug, Serialize)]
pub struct OrderInfo {
    /// Stable string id used by the API and the web UI.
    pub id: &'static str,
    /// Display name (the UI is French-first).
    pub name: &'static str,
    /// UI badge class.
    pub class: &'static str,
}

/// Catalog metadata, indexed by `OrderId as usize`.
static CATALOG: [OrderInfo; OrderId::COUNT] = [
    OrderInfo {
        id: "offload",
        name: "Arrêt / Délestage",
        class: "secondary",
    },
    OrderInfo {
        id: "nofreeze",
        name: "Hors-gel",
        class: "info",
    },
    OrderInfo {
        id: "economy",
        name: "Economie",
        class: "success",
    },
    OrderInfo {
        id: "cozy",
        name: "Confort",
        class: "danger",
    },
    OrderInfo {
        id: "cozyminus2",
        name: "Confort-2°",
        class: "warning",
    },
    OrderInfo {
        id: "cozyminus1",
        name: "Confort-1°",
        class: "warning",
    },
];
