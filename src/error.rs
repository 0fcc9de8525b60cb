use alloc::string::String;

use crate::Capability;

/// Errors raised by expander construction and pin operations.
///
/// Every variant describes a programming or configuration mistake.  Transport failures belong to
/// the [`I2cBus`][crate::I2cBus] implementation and never show up here.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No controller was given in the construction options.
    #[error("Expander expects a valid controller")]
    MissingController,
    /// The controller name does not match any known chip family.
    #[error("Expander expects a valid controller, got \"{0}\"")]
    InvalidController(String),
    /// The chip family does not implement this capability.
    #[error("Expander:{controller} does not support {capability}")]
    Unsupported {
        controller: String,
        capability: Capability,
    },
    /// The framework mode code names neither input nor output.
    #[error("Expander does not support mode {0}")]
    InvalidMode(u8),
    /// The pin index is outside of the device's pin table.
    #[error("Expander:{controller} has no pin {pin}")]
    InvalidPin { controller: String, pin: u8 },
    /// A controller tried to register more pins than an expander can hold.
    #[error("Expander pin table is limited to {0} pins")]
    TooManyPins(usize),
}

impl Error {
    pub(crate) fn unsupported(controller: &str, capability: Capability) -> Self {
        Error::Unsupported {
            controller: controller.into(),
            capability,
        }
    }
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}
