use crate::{Error, I2cBus, Pins};

/// What a [`Controller`][crate::Controller] operation may touch besides its own shadow registers.
pub struct Context<'a, B> {
    pub bus: &'a mut B,
    pub address: u8,
    pub pins: &'a Pins,
}

impl<'a, B: I2cBus> Context<'a, B> {
    /// Fail with [`Error::InvalidPin`] unless `pin` is in the pin table.
    pub fn check_pin(&self, controller: &str, pin: u8) -> Result<(), Error> {
        if (pin as usize) < self.pins.len() {
            Ok(())
        } else {
            Err(Error::InvalidPin {
                controller: controller.into(),
                pin,
            })
        }
    }
}

/// Set or clear bit `bit` of a shadow register, leaving all other bits alone.
///
/// `bit` must be below 8.  Callers map pin numbers onto bits themselves (see [`split_port()`])
/// and reject out of range pins first, usually through [`Context::check_pin()`].
pub fn update_bit(shadow: u8, bit: u8, set: bool) -> u8 {
    debug_assert!(bit < 8, "bit {} is outside of an 8-bit register", bit);
    if set {
        shadow | (1 << bit)
    } else {
        shadow & !(1 << bit)
    }
}

/// Split a 16-pin index into its port (0 = A, 1 = B) and the bit within that port.
pub fn split_port(pin: u8) -> (usize, u8) {
    if pin < 8 {
        (0, pin)
    } else {
        (1, pin - 8)
    }
}
