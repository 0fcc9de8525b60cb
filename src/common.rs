use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;

use crate::driver::Context;
use crate::{Error, I2cBus, ReadComplete};

/// Upper bound on the number of pins a single expander may expose.
pub const MAX_PINS: usize = 32;

/// Analog channel value of a pin which is not analog-capable.
pub const NO_ANALOG_CHANNEL: u8 = 127;

/// Completion handler for a digital read, called once with the level of the pin.
pub type DigitalReadCallback = Box<dyn FnOnce(Level)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Input,
    Output,
}

impl Mode {
    /// The numeric code of this mode in the given pin framework.
    pub fn code(self, codes: &crate::ModeCodes) -> u8 {
        match self {
            Mode::Input => codes.input,
            Mode::Output => codes.output,
        }
    }

    /// The mode a framework mode code stands for, if it names a digital mode.
    pub fn from_code(code: u8, codes: &crate::ModeCodes) -> Option<Mode> {
        [Mode::Input, Mode::Output]
            .into_iter()
            .find(|m| m.code(codes) == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    /// The level of bit `bit` in `byte`.
    pub fn from_bit(byte: u8, bit: u8) -> Self {
        Level::from((byte >> bit) & 0x01 != 0)
    }

    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> bool {
        level.is_high()
    }
}

impl core::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

/// Board capabilities an expander may or may not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PullUp,
    AnalogRead,
    AnalogWrite,
    PwmWrite,
    ServoWrite,
    I2cRead,
    I2cWrite,
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Capability::PullUp => "pull_up",
            Capability::AnalogRead => "analog_read",
            Capability::AnalogWrite => "analog_write",
            Capability::PwmWrite => "pwm_write",
            Capability::ServoWrite => "servo_write",
            Capability::I2cRead => "i2c_read",
            Capability::I2cWrite => "i2c_write",
        })
    }
}

/// Introspection record for one expander pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinState {
    pub mode: Mode,
    pub value: Level,
    /// Whether a digital read was requested since the last write.
    pub report: bool,
    pub supported_modes: &'static [Mode],
    pub analog_channel: u8,
}

impl PinState {
    pub const DIGITAL_MODES: &'static [Mode] = &[Mode::Input, Mode::Output];

    pub fn digital(mode: Mode) -> Self {
        Self {
            mode,
            value: Level::Low,
            report: false,
            supported_modes: Self::DIGITAL_MODES,
            analog_channel: NO_ANALOG_CHANNEL,
        }
    }
}

/// Pin table of one expander.
///
/// Shared between the expander and the completions of its in-flight reads, which is why it lives
/// behind an `Rc`.
#[derive(Clone, Default)]
pub struct Pins(Rc<RefCell<heapless::Vec<PinState, MAX_PINS>>>);

impl Pins {
    pub fn push(&self, state: PinState) -> Result<(), Error> {
        self.0
            .borrow_mut()
            .push(state)
            .map_err(|_| Error::TooManyPins(MAX_PINS))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, pin: u8) -> Option<PinState> {
        self.0.borrow().get(pin as usize).copied()
    }

    pub fn snapshot(&self) -> heapless::Vec<PinState, MAX_PINS> {
        self.0.borrow().clone()
    }

    pub fn update<F: FnOnce(&mut PinState)>(&self, pin: u8, f: F) {
        if let Some(state) = self.0.borrow_mut().get_mut(pin as usize) {
            f(state);
        }
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl core::fmt::Debug for Pins {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.0.borrow().iter()).finish()
    }
}

/// Register-level implementation of one expander chip family.
///
/// Implementations own their shadow registers.  Every operation gets a [`Context`] carrying the
/// bus, the device address and the pin table.  Capabilities a family lacks keep the default body,
/// which fails with [`Error::Unsupported`].
pub trait Controller<B: I2cBus> {
    /// Family identifier, upper case.
    fn name(&self) -> &str;

    /// Bus address used when none is configured.
    fn default_address(&self) -> u8;

    /// Program the chip into its default state and populate the pin table.
    fn initialize(&mut self, ctx: &mut Context<'_, B>) -> Result<(), Error>;

    fn pin_mode(&mut self, ctx: &mut Context<'_, B>, pin: u8, mode: Mode) -> Result<(), Error>;

    fn digital_write(&mut self, ctx: &mut Context<'_, B>, pin: u8, value: Level)
        -> Result<(), Error>;

    /// Issue a read of `pin`; `callback` fires once the bus delivers the data.
    fn digital_read(
        &mut self,
        ctx: &mut Context<'_, B>,
        pin: u8,
        callback: DigitalReadCallback,
    ) -> Result<(), Error>;

    /// Map a board pin number onto the chip's pin index.
    fn normalize(&self, pin: u8) -> u8 {
        pin
    }

    fn pull_up(&mut self, _ctx: &mut Context<'_, B>, _pin: u8, _value: Level) -> Result<(), Error> {
        Err(Error::unsupported(self.name(), Capability::PullUp))
    }

    fn analog_read(
        &mut self,
        _ctx: &mut Context<'_, B>,
        _pin: u8,
        _callback: Box<dyn FnOnce(u16)>,
    ) -> Result<(), Error> {
        Err(Error::unsupported(self.name(), Capability::AnalogRead))
    }

    fn analog_write(&mut self, _ctx: &mut Context<'_, B>, _pin: u8, _value: u16) -> Result<(), Error> {
        Err(Error::unsupported(self.name(), Capability::AnalogWrite))
    }

    fn pwm_write(&mut self, _ctx: &mut Context<'_, B>, _pin: u8, _value: u16) -> Result<(), Error> {
        Err(Error::unsupported(self.name(), Capability::PwmWrite))
    }

    fn servo_write(&mut self, _ctx: &mut Context<'_, B>, _pin: u8, _degrees: u16) -> Result<(), Error> {
        Err(Error::unsupported(self.name(), Capability::ServoWrite))
    }

    fn i2c_write(&mut self, _ctx: &mut Context<'_, B>, _address: u8, _bytes: &[u8]) -> Result<(), Error> {
        Err(Error::unsupported(self.name(), Capability::I2cWrite))
    }

    fn i2c_read(
        &mut self,
        _ctx: &mut Context<'_, B>,
        _address: u8,
        _register: Option<u8>,
        _count: usize,
        _on_complete: ReadComplete,
    ) -> Result<(), Error> {
        Err(Error::unsupported(self.name(), Capability::I2cRead))
    }
}

/// Pin Modes
pub mod mode {
    /// Trait for pin-modes which can be used to set a logic level.
    pub trait HasOutput {}
    /// Trait for pin-modes which can be used to read a logic level.
    pub trait HasInput {}

    /// Pin configured as an input.
    pub struct Input;
    impl HasInput for Input {}

    /// Pin configured as an output.
    pub struct Output;
    impl HasOutput for Output {}
}
