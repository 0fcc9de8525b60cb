//! Support for the `MCP23017` "16-Bit I/O Expander with Serial Interface"
//!
//! Datasheet: https://ww1.microchip.com/downloads/en/devicedoc/20001952c.pdf
//!
//! The MCP23017 offers two eight-bit GPIO ports.  Pins 0..=7 live on port A, pins 8..=15 on
//! port B, where they are addressed as bits 0..=7 of the B registers.
use alloc::boxed::Box;

use crate::driver::{split_port, update_bit, Context};
use crate::{Controller, DigitalReadCallback, Error, I2cBus, I2cExt, Level, Mode, PinState};

const NAME: &str = "MCP23017";
const ADDRESS: u8 = 0x20;
const PIN_COUNT: u8 = 16;

/// N.B.: These values are for BANK=0, which is the reset state of
/// the chip (and this driver does not change).
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Regs {
    /// IODIR: input/output direction: 0=output; 1=input
    IODIRA = 0x00,
    IODIRB = 0x01,
    /// GPPU: GPIO pull-ups: enables weak internal pull-ups on each pin (when configured
    ///   as an input)
    GPPUA = 0x0c,
    GPPUB = 0x0d,
    /// GPIO: reflects logic level on pins
    GPIOA = 0x12,
    GPIOB = 0x13,
    /// OLAT: output latches: sets state for pins configured as outputs
    OLATA = 0x14,
    OLATB = 0x15,
}

impl Regs {
    const IODIR: [Regs; 2] = [Regs::IODIRA, Regs::IODIRB];
    const GPPU: [Regs; 2] = [Regs::GPPUA, Regs::GPPUB];
    const GPIO: [Regs; 2] = [Regs::GPIOA, Regs::GPIOB];
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// `MCP23017` controller with shadow copies of both ports' registers.
#[derive(Debug, Clone)]
pub struct Mcp23017 {
    iodir: [u8; 2],
    olat: [u8; 2],
    /// Last value written to (or assumed on) the port register.
    gpio: [u8; 2],
    gppu: [u8; 2],
}

impl Mcp23017 {
    pub const fn new() -> Self {
        Self {
            iodir: [0xff; 2],
            olat: [0xff; 2],
            gpio: [0xff; 2],
            gppu: [0x00; 2],
        }
    }
}

impl Mcp23017 {
    /// Last value written to the GPIO register of `port` (0 = A, 1 = B).
    pub fn port_value(&self, port: usize) -> u8 {
        self.gpio[port]
    }
}

impl Default for Mcp23017 {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: I2cBus> Controller<B> for Mcp23017 {
    fn name(&self) -> &str {
        NAME
    }

    fn default_address(&self) -> u8 {
        ADDRESS
    }

    fn initialize(&mut self, ctx: &mut Context<'_, B>) -> Result<(), Error> {
        *self = Self::new();

        ctx.bus.i2c_config();
        ctx.bus.write_reg(ctx.address, Regs::IODIRA, self.iodir[0]);
        ctx.bus.write_reg(ctx.address, Regs::IODIRB, self.iodir[1]);

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
        let (port, bit) = split_port(pin);

        let iodir = update_bit(self.iodir[port], bit, mode == Mode::Input);
        ctx.pins.update(pin, |p| p.mode = mode);
        ctx.bus.write_reg(ctx.address, Regs::IODIR[port], iodir);

        self.iodir[port] = iodir;
        Ok(())
    }

    fn digital_write(&mut self, ctx: &mut Context<'_, B>, pin: u8, value: Level) -> Result<(), Error> {
        ctx.check_pin(NAME, pin)?;
        let (port, bit) = split_port(pin);

        let gpio = update_bit(self.olat[port], bit, value.is_high());
        ctx.pins.update(pin, |p| {
            p.report = false;
            p.value = value;
        });
        ctx.bus.write_reg(ctx.address, Regs::GPIO[port], gpio);

        self.olat[port] = gpio;
        self.gpio[port] = gpio;
        Ok(())
    }

    fn pull_up(&mut self, ctx: &mut Context<'_, B>, pin: u8, value: Level) -> Result<(), Error> {
        ctx.check_pin(NAME, pin)?;
        let (port, bit) = split_port(pin);

        let gppu = update_bit(self.gppu[port], bit, value.is_high());
        ctx.bus.write_reg(ctx.address, Regs::GPPU[port], gppu);

        self.gppu[port] = gppu;
        Ok(())
    }

    fn digital_read(
        &mut self,
        ctx: &mut Context<'_, B>,
        pin: u8,
        callback: DigitalReadCallback,
    ) -> Result<(), Error> {
        ctx.check_pin(NAME, pin)?;
        let (port, bit) = split_port(pin);

        ctx.pins.update(pin, |p| p.report = true);

        let pins = ctx.pins.clone();
        ctx.bus.read_reg(
            ctx.address,
            Regs::GPIO[port],
            Box::new(move |data: &[u8]| {
                let value = Level::from_bit(data.first().copied().unwrap_or_default(), bit);
                pins.update(pin, |p| p.value = value);
                callback(value);
            }),
        );
        Ok(())
    }
}
