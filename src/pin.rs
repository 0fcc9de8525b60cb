use core::marker::PhantomData;

use crate::{Error, Expander, I2cBus, Level, Mode, PortMutex};

/// Representation of an expander pin.
///
/// `Pin` borrows an expander which is wrapped in a [`PortMutex`], so any number of pins of the
/// same chip can be handed out at once.  Output pins implement the `embedded-hal` digital output
/// traits and can be passed to drivers written for native GPIOs.
pub struct Pin<'a, MODE, MUTEX> {
    pin: u8,
    port_driver: &'a MUTEX,
    _m: PhantomData<MODE>,
}

impl<'a, MODE, MUTEX, B> Pin<'a, MODE, MUTEX>
where
    B: I2cBus,
    MUTEX: PortMutex<Port = Expander<B>>,
{
    fn configure(pin: u8, port_driver: &'a MUTEX, mode: Mode) -> Result<Self, Error> {
        port_driver.lock(|drv| drv.pin_mode(pin, mode))?;
        Ok(Self {
            pin,
            port_driver,
            _m: PhantomData,
        })
    }

    pub fn pin_number(&self) -> u8 {
        self.pin
    }

    /// Level last written to, or read from, this pin.
    pub fn value(&self) -> Result<Level, Error> {
        self.port_driver.lock(|drv| {
            drv.pin(self.pin).map(|p| p.value).ok_or_else(|| Error::InvalidPin {
                controller: drv.name().into(),
                pin: self.pin,
            })
        })
    }

    pub fn into_input(self) -> Result<Pin<'a, crate::mode::Input, MUTEX>, Error> {
        Pin::configure(self.pin, self.port_driver, Mode::Input)
    }

    pub fn into_output(self) -> Result<Pin<'a, crate::mode::Output, MUTEX>, Error> {
        Pin::configure(self.pin, self.port_driver, Mode::Output)
    }
}

impl<'a, MUTEX, B> Pin<'a, crate::mode::Input, MUTEX>
where
    B: I2cBus,
    MUTEX: PortMutex<Port = Expander<B>>,
{
    /// Switch `pin` of the expander to input mode.
    pub fn input(pin: u8, port_driver: &'a MUTEX) -> Result<Self, Error> {
        Self::configure(pin, port_driver, Mode::Input)
    }

    /// Request the pin level; `callback` runs once the bus delivers it.
    pub fn read<F: FnOnce(Level) + 'static>(&self, callback: F) -> Result<(), Error> {
        self.port_driver
            .lock(|drv| drv.digital_read(self.pin, callback))
    }

    pub fn pull_up(&mut self, enable: bool) -> Result<(), Error> {
        self.port_driver
            .lock(|drv| drv.pull_up(self.pin, Level::from(enable)))
    }
}

impl<'a, MUTEX, B> Pin<'a, crate::mode::Output, MUTEX>
where
    B: I2cBus,
    MUTEX: PortMutex<Port = Expander<B>>,
{
    /// Switch `pin` of the expander to output mode.
    pub fn output(pin: u8, port_driver: &'a MUTEX) -> Result<Self, Error> {
        Self::configure(pin, port_driver, Mode::Output)
    }

    pub fn set_high(&mut self) -> Result<(), Error> {
        self.set(Level::High)
    }

    pub fn set_low(&mut self) -> Result<(), Error> {
        self.set(Level::Low)
    }

    pub fn set(&mut self, level: Level) -> Result<(), Error> {
        self.port_driver
            .lock(|drv| drv.digital_write(self.pin, level))
    }

    pub fn is_set_high(&self) -> Result<bool, Error> {
        self.value().map(Level::is_high)
    }

    pub fn is_set_low(&self) -> Result<bool, Error> {
        self.value().map(|l| !l.is_high())
    }

    pub fn toggle(&mut self) -> Result<(), Error> {
        let level = self.value()?;
        self.set(!level)
    }
}

impl<'a, MODE, MUTEX, B> embedded_hal::digital::ErrorType for Pin<'a, MODE, MUTEX>
where
    B: I2cBus,
    MUTEX: PortMutex<Port = Expander<B>>,
{
    type Error = Error;
}

impl<'a, MUTEX, B> embedded_hal::digital::OutputPin for Pin<'a, crate::mode::Output, MUTEX>
where
    B: I2cBus,
    MUTEX: PortMutex<Port = Expander<B>>,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self)
    }
}

impl<'a, MUTEX, B> embedded_hal::digital::StatefulOutputPin for Pin<'a, crate::mode::Output, MUTEX>
where
    B: I2cBus,
    MUTEX: PortMutex<Port = Expander<B>>,
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_high(self)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_low(self)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Pin::toggle(self)
    }
}
