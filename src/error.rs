//! Unified error types for the pilotwire firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! API handlers' and main loop's error handling uniform. All variants are
//! `Copy` so they pass through the service layer without allocation.
//!
//! Two deliberate asymmetries, inherited from the behaviour contract:
//! corrupt or missing *persisted* state is never surfaced as an error
//! (loaders fall back to compiled-in defaults with a warning), and a
//! failing per-zone resolution degrades that zone only, never the tick.

use core::fmt;

/// Every fallible configuration operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Malformed input, rejected before any mutation.
    Validation(ValidationError),
    /// The persistent store failed; in-memory state was left unchanged.
    Storage(StorageError),
    /// A hardware driver refused to initialise or apply.
    Hardware(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Hardware(msg) => write!(f, "hardware: {msg}"),
        }
    }
}

/// Input rejections. None of these mutate any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Order id is outside the closed catalog.
    UnknownOrder,
    /// No planning with the given id.
    UnknownPlanning,
    /// No slot with the given id in this planning.
    UnknownSlot,
    /// No zone with the given id in the active zone set.
    UnknownZone,
    /// No registered hardware definition with the given id.
    UnknownHardware,
    /// No declared parameter with the given id on this hardware.
    UnknownParameter,
    /// Wrote an integer into a string parameter or vice versa.
    ParameterTypeMismatch,
    /// Another planning already uses this description.
    DuplicateDescription,
    /// Another slot in this planning already occupies (dow, hour, minute).
    DuplicateSlot,
    /// A zone with this id already exists in the set.
    DuplicateZone,
    /// The Sunday-00:00 anchor slot cannot be removed or relocated.
    AnchorSlotProtected,
    /// Day-of-week, hour or minute outside its range.
    TimeOutOfRange,
    /// Text exceeds its bounded buffer.
    TextTooLong,
    /// The target collection is at its fixed capacity.
    CapacityExhausted,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOrder => write!(f, "unknown order"),
            Self::UnknownPlanning => write!(f, "unknown planning"),
            Self::UnknownSlot => write!(f, "unknown slot"),
            Self::UnknownZone => write!(f, "unknown zone"),
            Self::UnknownHardware => write!(f, "unknown hardware"),
            Self::UnknownParameter => write!(f, "unknown parameter"),
            Self::ParameterTypeMismatch => write!(f, "parameter type mismatch"),
            Self::DuplicateDescription => write!(f, "description already in use"),
            Self::DuplicateSlot => write!(f, "slot time already occupied"),
            Self::DuplicateZone => write!(f, "zone id already exists"),
            Self::AnchorSlotProtected => write!(f, "anchor slot is protected"),
            Self::TimeOutOfRange => write!(f, "time component out of range"),
            Self::TextTooLong => write!(f, "text too long"),
            Self::CapacityExhausted => write!(f, "capacity exhausted"),
        }
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Failures of the persistent key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Stored value failed structured parsing.
    Corrupted,
    /// Storage partition is full.
    Full,
    /// Generic I/O error from the backend.
    Io,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Corrupted => write!(f, "value corrupted"),
            Self::Full => write!(f, "storage full"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::error::Error for Error {}
impl core::error::Error for ValidationError {}
impl core::error::Error for StorageError {}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
