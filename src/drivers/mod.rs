//! GPIO-level drivers.

pub mod s2p595;
pub mod watchdog;
