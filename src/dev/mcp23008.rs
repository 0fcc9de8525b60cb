//! Support for the `MCP23008` "8-Bit I/O Expander with Serial Interface"
//!
//! Datasheet: https://ww1.microchip.com/downloads/en/DeviceDoc/MCP23008-MCP23S08-Data-Sheet-20001919F.pdf
use alloc::boxed::Box;

use crate::driver::{update_bit, Context};
use crate::{Controller, DigitalReadCallback, Error, I2cBus, I2cExt, Level, Mode, PinState};

const NAME: &str = "MCP23008";
const ADDRESS: u8 = 0x20;
const PIN_COUNT: u8 = 8;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regs {
    /// IODIR: input/output direction: 0=output; 1=input
    IODIR = 0x00,
    /// GPPU: weak pull-ups on input pins
    GPPU = 0x06,
    GPIO = 0x09,
    OLAT = 0x0a,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// `MCP23008` controller, the single-port sibling of the
/// [`Mcp23017`][crate::dev::mcp23017::Mcp23017].
#[derive(Debug, Clone)]
pub struct Mcp23008 {
    iodir: u8,
    olat: u8,
    gpio: u8,
    gppu: u8,
}

impl Mcp23008 {
    pub const fn new() -> Self {
        Self {
            iodir: 0xff,
            olat: 0xff,
            gpio: 0xff,
            gppu: 0x00,
        }
    }
}

impl Mcp23008 {
    /// Last value written to the GPIO register.
    pub fn port_value(&self) -> u8 {
        self.gpio
    }
}

impl Default for Mcp23008 {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: I2cBus> Controller<B> for Mcp23008 {
    fn name(&self) -> &str {
        NAME
    }

    fn default_address(&self) -> u8 {
        ADDRESS
    }

    fn initialize(&mut self, ctx: &mut Context<'_, B>) -> Result<(), Error> {
        *self = Self::new();

        ctx.bus.i2c_config();
        ctx.bus.write_reg(ctx.address, Regs::IODIR, self.iodir);

        ctx.pins.clear();
        for pin in 0..PIN_COUNT {
            ctx.pins.push(PinState::digital(Mode::Input))?;
            self.pin_mode(ctx, pin, Mode::Output)?;
            self.digital_write(ctx, pin, Level::Low)?;
        }
        Ok(())
    }

    fn pin_mode(&mut self, ctx: &mut Context<'_, B>, pin: u8, mode: Mode) -> Result<(), Error> {
        ctx.check_pin(NAME, pin)?;

        let iodir = update_bit(self.iodir, pin, mode == Mode::Input);
        ctx.pins.update(pin, |p| p.mode = mode);
        ctx.bus.write_reg(ctx.address, Regs::IODIR, iodir);

        self.iodir = iodir;
        Ok(())
    }

    fn digital_write(&mut self, ctx: &mut Context<'_, B>, pin: u8, value: Level) -> Result<(), Error> {
        ctx.check_pin(NAME, pin)?;

        let gpio = update_bit(self.olat, pin, value.is_high());
        ctx.pins.update(pin, |p| {
            p.report = false;
            p.value = value;
        });
        ctx.bus.write_reg(ctx.address, Regs::GPIO, gpio);

        self.olat = gpio;
        self.gpio = gpio;
        Ok(())
    }

    fn pull_up(&mut self, ctx: &mut Context<'_, B>, pin: u8, value: Level) -> Result<(), Error> {
        ctx.check_pin(NAME, pin)?;

        let gppu = update_bit(self.gppu, pin, value.is_high());
        ctx.bus.write_reg(ctx.address, Regs::GPPU, gppu);

        self.gppu = gppu;
        Ok(())
    }

    fn digital_read(
        &mut self,
        ctx: &mut Context<'_, B>,
        pin: u8,
        callback: DigitalReadCallback,
    ) -> Result<(), Error> {
        ctx.check_pin(NAME, pin)?;
        ctx.pins.update(pin, |p| p.report = true);

        let pins = ctx.pins.clone();
        ctx.bus.read_reg(
            ctx.address,
            Regs::GPIO,
            Box::new(move |data: &[u8]| {
                let value = Level::from_bit(data.first().copied().unwrap_or_default(), pin);
                pins.update(pin, |p| p.value = value);
                callback(value);
            }),
        );
        Ok(())
    }
}
