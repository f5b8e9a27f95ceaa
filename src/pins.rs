//! GPIO assignments for the M1 mainboard.
//!
//! Single source of truth — drivers reference this module rather than
//! hard-coding pin numbers. The M1 routes one 74HC595 control bus to
//! the E1 expansion connectors; every attached board shares it.

/// 74HC595 SER — serial data into the first register of the chain.
pub const S2P_SERIAL_GPIO: i32 = 23;
/// 74HC595 SRCLK — shift clock, rising-edge triggered.
pub const S2P_SHIFT_CLOCK_GPIO: i32 = 18;
/// 74HC595 RCLK — latch clock, rising-edge triggered.
pub const S2P_LATCH_CLOCK_GPIO: i32 = 5;
/// 74HC595 /MR — master reset, active low.
pub const S2P_RESET_GPIO: i32 = 19;
/// 74HC595 /OE — output enable, active low.
pub const S2P_OUTPUT_ENABLE_GPIO: i32 = 21;
