#![cfg_attr(not(test), no_std)]

extern crate alloc;
#[cfg(all(feature = "std", not(test)))]
extern crate std;

mod active;
mod bus;
mod common;
pub mod dev;
pub mod driver;
mod error;
mod expander;
mod mutex;
mod pin;
#[cfg(feature = "async")]
mod pin_async;

pub use active::{Active, Filter, Registration, Registry};
pub use bus::{HalBus, I2cBus, ModeCodes, ReadComplete};
pub use common::mode;
pub use common::{
    Capability, Controller, DigitalReadCallback, Level, Mode, PinState, Pins, MAX_PINS,
    NO_ANALOG_CHANNEL,
};
pub use driver::Context;
pub use error::Error;
pub use expander::{Expander, Options};
pub use mutex::PortMutex;
pub use pin::Pin;
#[cfg(feature = "async")]
pub use pin_async::ReadFuture;

pub(crate) use bus::I2cExt;

pub use dev::mcp23008::Mcp23008;
pub use dev::mcp23017::Mcp23017;
pub use dev::pcf8574::Pcf8574;
pub use dev::Family;
