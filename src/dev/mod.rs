//! The device module contains the controller implementation for each supported chip family.
//!
//! In most cases you will not need anything from here explicitly: naming the family in
//! [`Options::controller()`][crate::Options::controller] is enough.

use alloc::boxed::Box;
use alloc::string::String;

use crate::{Controller, Error, I2cBus};

pub mod mcp23008;
pub mod mcp23017;
pub mod pcf8574;

/// The chip families that can be selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Mcp23017,
    Mcp23008,
    Pcf8574,
    Pcf8574a,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::Mcp23017,
        Family::Mcp23008,
        Family::Pcf8574,
        Family::Pcf8574a,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Family::Mcp23017 => "MCP23017",
            Family::Mcp23008 => "MCP23008",
            Family::Pcf8574 => "PCF8574",
            Family::Pcf8574a => "PCF8574A",
        }
    }

    /// Resolve a family identifier, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InvalidController(String::from(name)))
    }

    /// A controller of this family, in its power-on state.
    pub fn controller<B: I2cBus>(self) -> Box<dyn Controller<B>> {
        match self {
            Family::Mcp23017 => Box::new(mcp23017::Mcp23017::new()),
            Family::Mcp23008 => Box::new(mcp23008::Mcp23008::new()),
            Family::Pcf8574 => Box::new(pcf8574::Pcf8574::new()),
            Family::Pcf8574a => Box::new(pcf8574::Pcf8574::a_variant()),
        }
    }
}

impl core::str::FromStr for Family {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
