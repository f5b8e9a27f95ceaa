//! Driven adapters binding the port traits to ESP-IDF services.
//!
//! Every adapter has a host-side simulation backend so the full
//! configuration engine runs in plain `cargo test`.

pub mod clock;
pub mod log_sink;
pub mod nvs;
