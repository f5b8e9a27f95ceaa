//! M1E1: NodeMCU 30-pin DevKit on the M1 mainboard with E1 expansion
//! boards.
//!
//! Each E1 board carries one 74HC595 whose eight outputs gate the
//! positive/negative half-waves of four pilot wires. Boards share the
//! M1's shift bus and are daisy-chained, so one shift-out of
//! `8 × e1_count` bits followed by a single latch updates every zone
//! at once.

use log::info;

use crate::app::ports::HardwareDriver;
use crate::clock::WeekTime;
use crate::config::MAX_ZONE_COUNT;
use crate::error::{Error, Result};
use crate::hw::HwParam;
use crate::zones::ZoneSet;

pub const PARAM_E1_COUNT: &str = "e1_count";

const ZONES_PER_BOARD: usize = 4;
const MAX_E1_BOARDS: i32 = (MAX_ZONE_COUNT / ZONES_PER_BOARD) as i32;

#[cfg(target_os = "espidf")]
type Chain = crate::drivers::s2p595::S2p595<
    esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>,
    esp_idf_hal::delay::Delay,
>;

/// Host stand-in for the shift chain: remembers the last shifted
/// pattern so tests can assert on the exact bit stream.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct Chain {
    bits: Vec<bool>,
}

pub struct M1E1Hardware {
    params: [HwParam; 1],
    chain: Option<Chain>,
}

impl M1E1Hardware {
    pub fn new() -> Self {
        Self {
            params: [HwParam::integer(
                PARAM_E1_COUNT,
                "Number of attached E1 boards",
                0,
            )],
            chain: None,
        }
    }

    fn board_count(&self) -> i32 {
        self.params[0].as_i32().unwrap_or(0)
    }

    /// Last bit pattern pushed to the (simulated) chain, shift order.
    #[cfg(not(target_os = "espidf"))]
    pub fn shifted_bits(&self) -> &[bool] {
        self.chain.as_ref().map_or(&[], |c| &c.bits)
    }

    #[cfg(target_os = "espidf")]
    fn open_chain() -> Result<Chain> {
        use esp_idf_hal::delay::Delay;
        use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};

        use crate::drivers::s2p595::S2p595;
        use crate::pins;

        // SAFETY: these pins are routed to the shift bus on the M1
        // schematic and are taken exactly once, here, at init.
        let pin = |gpio| {
            let any = unsafe { AnyOutputPin::new(gpio) };
            PinDriver::output(any).map_err(|_| Error::Hardware("shift bus pin unavailable"))
        };

        let mut chain = S2p595::new(
            pin(pins::S2P_SERIAL_GPIO)?,
            pin(pins::S2P_SHIFT_CLOCK_GPIO)?,
            pin(pins::S2P_LATCH_CLOCK_GPIO)?,
            pin(pins::S2P_RESET_GPIO)?,
            pin(pins::S2P_OUTPUT_ENABLE_GPIO)?,
            Delay::new_default(),
        );
        chain
            .setup()
            .map_err(|_| Error::Hardware("shift chain setup failed"))?;
        Ok(chain)
    }
}

impl Default for M1E1Hardware {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareDriver for M1E1Hardware {
    fn id(&self) -> &'static str {
        "M1E1"
    }

    fn description(&self) -> &'static str {
        "DevKit NodeMCU 30 pin with mainboard M1 and expansion boards E1"
    }

    fn params(&self) -> &[HwParam] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [HwParam] {
        &mut self.params
    }

    fn init(&mut self) -> Result<ZoneSet> {
        let boards = self.board_count();
        if !(1..=MAX_E1_BOARDS).contains(&boards) {
            return Err(Error::Hardware("e1_count outside 1..=16"));
        }

        let mut zones = ZoneSet::new();
        for board in 1..=boards {
            for n in 1..=ZONES_PER_BOARD {
                let id = format!("e{board}z{n}");
                zones.add(&id, &id)?;
            }
        }

        #[cfg(target_os = "espidf")]
        {
            self.chain = Some(Self::open_chain()?);
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.chain = Some(Chain::default());
        }

        info!("M1E1 ready, {} boards, {} zones", boards, zones.len());
        Ok(zones)
    }

    fn apply(&mut self, zones: &ZoneSet, now: &WeekTime) -> Result<()> {
        let Some(chain) = self.chain.as_mut() else {
            return Err(Error::Hardware("shift chain not initialised"));
        };

        // Zones shift in reverse so the first zone's gates end up in the
        // first register once the whole stream has rippled through; each
        // zone contributes (negative, positive) in that order.
        #[cfg(target_os = "espidf")]
        {
            for zone in zones.as_slice().iter().rev() {
                let signal = zone.current.signal(now);
                chain
                    .shift_bit(signal.negative)
                    .and_then(|()| chain.shift_bit(signal.positive))
                    .map_err(|_| Error::Hardware("shift bus write failed"))?;
            }
            chain
                .latch()
                .map_err(|_| Error::Hardware("shift bus latch failed"))?;
        }
        #[cfg(not(target_os = "espidf"))]
        {
            chain.bits.clear();
            for zone in zones.as_slice().iter().rev() {
                let signal = zone.current.signal(now);
                chain.bits.push(signal.negative);
                chain.bits.push(signal.positive);
            }
        }
        Ok(())
    }
}
