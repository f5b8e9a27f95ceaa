//! Hardware definitions: typed parameters and the variant registry.
//!
//! Each supported board implements [`HardwareDriver`](crate::app::ports::HardwareDriver)
//! and registers itself at startup. The registry is immutable afterwards
//! except for parameter values, which the configuration API may edit and
//! persist.

pub mod esp32;
pub mod m1e1;

use heapless::String as BoundedString;
use serde::Serialize;

use crate::app::ports::HardwareDriver;
use crate::config::{MAX_HARDWARE_COUNT, MAX_LEN_VALUE};
use crate::error::{Result, ValidationError};

/// A typed parameter value. The persisted type tag of each parameter is
/// fixed by its declaration; writes of the other type are refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParamValue {
    Integer(i32),
    Text(BoundedString<MAX_LEN_VALUE>),
}

/// One configurable hardware parameter.
///
/// Declarations carry a compiled-in default; persisted values overlay
/// the default at boot and silently fall back to it when absent, so an
/// unconfigured board still comes up usable.
#[derive(Debug, Clone, Serialize)]
pub struct HwParam {
    pub id: &'static str,
    pub description: &'static str,
    pub value: ParamValue,
}

impl HwParam {
    pub const fn integer(id: &'static str, description: &'static str, default: i32) -> Self {
        Self {
            id,
            description,
            value: ParamValue::Integer(default),
        }
    }

    pub fn text(id: &'static str, description: &'static str, default: &str) -> Self {
        Self {
            id,
            description,
            value: ParamValue::Text(
                BoundedString::try_from(default).expect("default parameter value within bound"),
            ),
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.value {
            ParamValue::Integer(v) => Some(v),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            ParamValue::Text(v) => Some(v.as_str()),
            ParamValue::Integer(_) => None,
        }
    }

    pub fn set_i32(&mut self, value: i32) -> Result<()> {
        match &mut self.value {
            ParamValue::Integer(v) => {
                *v = value;
                Ok(())
            }
            ParamValue::Text(_) => Err(ValidationError::ParameterTypeMismatch.into()),
        }
    }

    pub fn set_text(&mut self, value: &str) -> Result<()> {
        match &mut self.value {
            ParamValue::Text(v) => {
                *v = BoundedString::try_from(value).map_err(|()| ValidationError::TextTooLong)?;
                Ok(())
            }
            ParamValue::Integer(_) => Err(ValidationError::ParameterTypeMismatch.into()),
        }
    }
}

/// Look up a declared parameter on a driver.
pub fn find_param<'a>(driver: &'a dyn HardwareDriver, param_id: &str) -> Option<&'a HwParam> {
    driver.params().iter().find(|p| p.id == param_id)
}

pub fn find_param_mut<'a>(
    driver: &'a mut dyn HardwareDriver,
    param_id: &str,
) -> Option<&'a mut HwParam> {
    driver.params_mut().iter_mut().find(|p| p.id == param_id)
}

/// Registration-ordered set of hardware variants, filled once at startup.
#[derive(Default)]
pub struct HardwareRegistry {
    drivers: Vec<Box<dyn HardwareDriver>>,
}

impl HardwareRegistry {
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Register a variant. Capacity overflow means the firmware image
    /// itself is wrong, so the caller treats this as fatal at startup.
    pub fn register(&mut self, driver: Box<dyn HardwareDriver>) -> Result<()> {
        if self.drivers.len() >= MAX_HARDWARE_COUNT {
            return Err(ValidationError::CapacityExhausted.into());
        }
        log::debug!(
            "registering hardware definition {} with {} parameters",
            driver.id(),
            driver.params().len()
        );
        self.drivers.push(driver);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn HardwareDriver> {
        self.drivers.iter().map(Box::as_ref)
    }

    pub fn index_of(&self, hw_id: &str) -> Option<usize> {
        self.drivers.iter().position(|d| d.id() == hw_id)
    }

    pub fn get(&self, index: usize) -> Option<&dyn HardwareDriver> {
        self.drivers.get(index).map(Box::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut (dyn HardwareDriver + 'static)> {
        self.drivers.get_mut(index).map(Box::as_mut)
    }

    pub fn find(&self, hw_id: &str) -> Option<&dyn HardwareDriver> {
        self.index_of(hw_id).and_then(|i| self.get(i))
    }

    pub fn find_mut(&mut self, hw_id: &str) -> Option<&mut (dyn HardwareDriver + 'static)> {
        self.index_of(hw_id).and_then(move |i| self.get_mut(i))
    }
}
