//! 74HC595 serial-to-parallel shift register chain driver.
//!
//! The M1 mainboard daisy-chains one 595 per E1 expansion board; eight
//! outputs per register gate the positive/negative half-waves of four
//! pilot wires. Generic over `embedded-hal` pins and delay so the bit
//! protocol is testable on the host; on target the pins are ESP-IDF
//! `PinDriver`s.
//!
//! Timing: every level change settles for 1 µs before the next edge,
//! comfortably above the 595's 100 ns setup/hold requirements even
//! through the board's level shifters.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

const SETTLE_US: u32 = 1;

pub struct S2p595<P: OutputPin, D: DelayNs> {
    serial_in: P,
    shift_clock: P,
    latch_clock: P,
    /// /MR — active low.
    reset: P,
    /// /OE — active low.
    output_enable: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> S2p595<P, D> {
    pub fn new(
        serial_in: P,
        shift_clock: P,
        latch_clock: P,
        reset: P,
        output_enable: P,
        delay: D,
    ) -> Self {
        Self {
            serial_in,
            shift_clock,
            latch_clock,
            reset,
            output_enable,
            delay,
        }
    }

    /// Bring the chain to a known all-low state: outputs are kept
    /// disabled while the registers are cleared and latched, so the
    /// heaters never see a transient pattern.
    pub fn setup(&mut self) -> Result<(), P::Error> {
        self.disable_output()?;

        write(&mut self.serial_in, &mut self.delay, false)?;
        write(&mut self.shift_clock, &mut self.delay, false)?;
        write(&mut self.latch_clock, &mut self.delay, false)?;

        self.reset_registers()?;
        self.latch()?;
        self.enable_output()
    }

    /// Shift one bit into the chain (into the first register; earlier
    /// bits move towards the end of the chain).
    pub fn shift_bit(&mut self, bit: bool) -> Result<(), P::Error> {
        write(&mut self.serial_in, &mut self.delay, bit)?;
        write(&mut self.shift_clock, &mut self.delay, false)?;
        write(&mut self.shift_clock, &mut self.delay, true)?;
        write(&mut self.shift_clock, &mut self.delay, false)
    }

    /// Snapshot the shifted bits onto the output stage.
    pub fn latch(&mut self) -> Result<(), P::Error> {
        write(&mut self.latch_clock, &mut self.delay, false)?;
        write(&mut self.latch_clock, &mut self.delay, true)?;
        write(&mut self.latch_clock, &mut self.delay, false)
    }

    /// Clear the shift stage (not the output stage until latched).
    pub fn reset_registers(&mut self) -> Result<(), P::Error> {
        write(&mut self.reset, &mut self.delay, false)?;
        write(&mut self.reset, &mut self.delay, true)
    }

    pub fn enable_output(&mut self) -> Result<(), P::Error> {
        write(&mut self.output_enable, &mut self.delay, false)
    }

    pub fn disable_output(&mut self) -> Result<(), P::Error> {
        write(&mut self.output_enable, &mut self.delay, true)
    }
}

fn write<P: OutputPin, D: DelayNs>(pin: &mut P, delay: &mut D, high: bool) -> Result<(), P::Error> {
    if high {
        pin.set_high()?;
    } else {
        pin.set_low()?;
    }
    delay.delay_us(SETTLE_US);
    Ok(())
}
