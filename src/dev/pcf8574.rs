//! Support for the `PCF8574` & `PCF8574A` "Remote 8-bit I/O expander for I2C-bus with interrupt"
//!
//! The PCF8574 has no direction or pull-up registers: its pins are quasi-bidirectional and the
//! chip only understands a single byte written to, or read from, the device.  Direction is
//! emulated here by keeping a shadow direction byte and driving all non-output pins high.
//!
//! The `A` variant is identical apart from its base address (0x38 instead of 0x20).
use alloc::boxed::Box;

use crate::driver::{update_bit, Context};
use crate::{Controller, DigitalReadCallback, Error, I2cBus, I2cExt, Level, Mode, PinState};

const PIN_COUNT: u8 = 8;

/// Level of the pins which are not under output control.
///
/// P4 is left out of the set and so idles low.
const READ_MASK: u8 = 0xef;

/// `PCF8574` / `PCF8574A` controller.
#[derive(Debug, Clone)]
pub struct Pcf8574 {
    a_variant: bool,
    /// Output latch; a set bit pulls the pin low.
    port: u8,
    /// Emulated direction register; a set bit marks an output.
    ddr: u8,
}

impl Pcf8574 {
    pub const fn new() -> Self {
        Self {
            a_variant: false,
            port: 0x00,
            ddr: 0x00,
        }
    }

    /// The `PCF8574A`, which answers on 0x38..=0x3f.
    pub const fn a_variant() -> Self {
        Self {
            a_variant: true,
            ..Self::new()
        }
    }

    fn family(&self) -> &'static str {
        if self.a_variant {
            "PCF8574A"
        } else {
            "PCF8574"
        }
    }

    /// The byte to put on the bus for the current shadow state.
    fn io_byte(&self) -> u8 {
        (READ_MASK & !self.ddr) | self.port
    }
}

impl Default for Pcf8574 {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: I2cBus> Controller<B> for Pcf8574 {
    fn name(&self) -> &str {
        self.family()
    }

    fn default_address(&self) -> u8 {
        if self.a_variant {
            0x38
        } else {
            0x20
        }
    }

    fn initialize(&mut self, ctx: &mut Context<'_, B>) -> Result<(), Error> {
        self.port = 0x00;
        self.ddr = 0x00;

        ctx.bus.i2c_config();

        ctx.pins.clear();
        for pin in 0..PIN_COUNT {
            ctx.pins.push(PinState::digital(Mode::Output))?;
            self.pin_mode(ctx, pin, Mode::Output)?;
            self.digital_write(ctx, pin, Level::Low)?;
        }

        // quasi-bidirectional pins idle high
        ctx.bus.write_byte(ctx.address, 0xff);
        Ok(())
    }

    fn pin_mode(&mut self, ctx: &mut Context<'_, B>, pin: u8, mode: Mode) -> Result<(), Error> {
        ctx.check_pin(self.family(), pin)?;

        self.ddr = update_bit(self.ddr, pin, mode == Mode::Output);
        self.port = update_bit(self.port, pin, false);
        ctx.pins.update(pin, |p| p.mode = mode);

        ctx.bus.write_byte(ctx.address, self.io_byte());
        Ok(())
    }

    fn digital_write(&mut self, ctx: &mut Context<'_, B>, pin: u8, value: Level) -> Result<(), Error> {
        ctx.check_pin(self.family(), pin)?;

        // Inverted on purpose: the latch sinks current when its bit is set.
        self.port = update_bit(self.port, pin, !value.is_high());
        ctx.pins.update(pin, |p| {
            p.report = false;
            p.value = value;
        });

        ctx.bus.write_byte(ctx.address, self.io_byte());
        Ok(())
    }

    fn digital_read(
        &mut self,
        ctx: &mut Context<'_, B>,
        pin: u8,
        callback: DigitalReadCallback,
    ) -> Result<(), Error> {
        ctx.check_pin(self.family(), pin)?;
        ctx.pins.update(pin, |p| p.report = true);

        let pins = ctx.pins.clone();
        ctx.bus.read_byte(
            ctx.address,
            Box::new(move |data: &[u8]| {
                let value = Level::from_bit(data.first().copied().unwrap_or_default(), pin);
                pins.update(pin, |p| p.value = value);
                callback(value);
            }),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Capability, Error, Expander, HalBus, Level, Mode, Options};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    const INIT: [u8; 17] = [
        238, 239, 237, 239, 235, 239, 231, 239, 239, 255, 223, 255, 191, 255, 127, 255, 255,
    ];

    fn init_transactions(addr: u8) -> Vec<mock_i2c::Transaction> {
        INIT.iter()
            .map(|b| mock_i2c::Transaction::write(addr, vec![*b]))
            .collect()
    }

    fn expander(i2c: &mock_i2c::Mock, name: &str) -> Expander<HalBus<mock_i2c::Mock>> {
        Expander::new(HalBus::new(i2c.clone()), Options::new().controller(name)).unwrap()
    }

    #[test]
    fn initialization() {
        let _serial = crate::testing::serial();
        let mut i2c = mock_i2c::Mock::new(&init_transactions(0x20));

        let exp = expander(&i2c, "PCF8574");
        assert_eq!(exp.name(), "PCF8574");
        assert_eq!(exp.address(), 0x20);
        assert_eq!(exp.pins().len(), 8);

        i2c.done();
    }

    #[test]
    fn initialization_a_variant() {
        let _serial = crate::testing::serial();
        let mut i2c = mock_i2c::Mock::new(&init_transactions(0x38));

        let exp = expander(&i2c, "pcf8574a");
        assert_eq!(exp.name(), "PCF8574A");
        assert_eq!(exp.address(), 0x38);

        i2c.done();
    }

    #[test]
    fn pin_mode() {
        let _serial = crate::testing::serial();
        let mut expectations = init_transactions(0x38);
        for b in [255, 255, 255, 255, 239, 239, 239, 239] {
            expectations.push(mock_i2c::Transaction::write(0x38, vec![b]));
        }
        let mut i2c = mock_i2c::Mock::new(&expectations);

        let mut exp = expander(&i2c, "PCF8574A");
        for pin in 0..8 {
            exp.pin_mode(pin, Mode::Input).unwrap();
        }

        i2c.done();
    }

    #[test]
    fn digital_write_is_inverted() {
        let _serial = crate::testing::serial();
        let mut expectations = init_transactions(0x20);
        for b in [0xfe, 0xfc, 0xf8, 0xf0, 0xe0, 0xc0, 0x80, 0x00] {
            expectations.push(mock_i2c::Transaction::write(0x20, vec![b]));
        }
        for _ in 0..8 {
            expectations.push(mock_i2c::Transaction::write(0x20, vec![0x00]));
        }
        expectations.push(mock_i2c::Transaction::write(0x20, vec![0x04]));
        expectations.push(mock_i2c::Transaction::write(0x20, vec![0x00]));
        let mut i2c = mock_i2c::Mock::new(&expectations);

        let mut exp = expander(&i2c, "PCF8574");
        for pin in 0..8 {
            exp.pin_mode(pin, Mode::Output).unwrap();
        }
        for pin in 0..8 {
            exp.digital_write(pin, Level::High).unwrap();
        }
        // LOW sets the latch bit, HIGH clears it
        exp.digital_write(2, Level::Low).unwrap();
        exp.digital_write(2, Level::High).unwrap();

        i2c.done();
    }

    #[test]
    fn digital_read() {
        let _serial = crate::testing::serial();
        let mut expectations = init_transactions(0x20);
        expectations.push(mock_i2c::Transaction::read(0x20, vec![0b0100_0000]));
        expectations.push(mock_i2c::Transaction::read(0x20, vec![0b1011_1111]));
        let mut i2c = mock_i2c::Mock::new(&expectations);

        let mut exp = expander(&i2c, "PCF8574");
        let seen = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..2 {
            let s = seen.clone();
            exp.digital_read(6, move |v| s.borrow_mut().push(v)).unwrap();
        }
        assert!(seen.borrow().is_empty());

        exp.bus_mut().poll().unwrap();
        // one call per read, each with its own result
        assert_eq!(*seen.borrow(), vec![Level::High, Level::Low]);
        assert_eq!(exp.pin(6).unwrap().value, Level::Low);

        i2c.done();
    }

    #[test]
    fn unsupported() {
        let _serial = crate::testing::serial();
        let mut i2c = mock_i2c::Mock::new(&init_transactions(0x20));
        let mut exp = expander(&i2c, "PCF8574");

        for (err, capability) in [
            (exp.pull_up(0, Level::High).unwrap_err(), Capability::PullUp),
            (exp.analog_write(0, 1).unwrap_err(), Capability::AnalogWrite),
            (exp.servo_write(0, 1).unwrap_err(), Capability::ServoWrite),
            (exp.i2c_write(0x20, &[1]).unwrap_err(), Capability::I2cWrite),
        ] {
            assert_eq!(
                err,
                Error::Unsupported {
                    controller: "PCF8574".into(),
                    capability
                }
            );
        }

        i2c.done();
    }
}
