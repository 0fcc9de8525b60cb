use alloc::boxed::Box;
use alloc::string::String;

use crate::active::{Active, Filter, Registration};
use crate::dev::Family;
use crate::driver::Context;
use crate::{Controller, Error, I2cBus, Level, ModeCodes, Mode, PinState, Pins, MAX_PINS};

enum Selection<B: I2cBus> {
    Named(String),
    Family(Family),
    Custom(Box<dyn Controller<B>>),
}

/// Construction options for an [`Expander`].
///
/// ```ignore
/// let expander = Expander::new(bus, Options::new().controller("mcp23017").address(0x21))?;
/// ```
pub struct Options<B: I2cBus> {
    controller: Option<Selection<B>>,
    address: Option<u8>,
    on_connect: Option<Box<dyn FnOnce()>>,
    on_ready: Option<Box<dyn FnOnce()>>,
}

impl<B: I2cBus> Options<B> {
    pub fn new() -> Self {
        Self {
            controller: None,
            address: None,
            on_connect: None,
            on_ready: None,
        }
    }

    /// Select the chip family by name, e.g. `"MCP23017"`.  Case does not matter.
    pub fn controller(mut self, name: &str) -> Self {
        self.controller = Some(Selection::Named(name.into()));
        self
    }

    pub fn family(mut self, family: Family) -> Self {
        self.controller = Some(Selection::Family(family));
        self
    }

    /// Use a controller implementation from outside this crate.
    pub fn custom<C: Controller<B> + 'static>(mut self, controller: C) -> Self {
        self.controller = Some(Selection::Custom(Box::new(controller)));
        self
    }

    /// Bus address of the chip.  Defaults to the family's base address.
    pub fn address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }

    pub fn on_connect<F: FnOnce() + 'static>(mut self, f: F) -> Self {
        self.on_connect = Some(Box::new(f));
        self
    }

    pub fn on_ready<F: FnOnce() + 'static>(mut self, f: F) -> Self {
        self.on_ready = Some(Box::new(f));
        self
    }
}

impl<B: I2cBus> Default for Options<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// One expander chip, bound to one bus address.
///
/// Offers the same pin operations as a natively attached board.  Writes reach the bus
/// immediately; reads complete whenever the bus delivers their data.
pub struct Expander<B: I2cBus> {
    bus: B,
    controller: Box<dyn Controller<B>>,
    address: u8,
    pins: Pins,
    modes: ModeCodes,
    ready: bool,
}

impl<B: I2cBus> Expander<B> {
    pub const HIGH: Level = Level::High;
    pub const LOW: Level = Level::Low;

    /// Resolve the controller, initialize the chip and register it in [`Active`].
    pub fn new(bus: B, options: Options<B>) -> Result<Self, Error> {
        let Options {
            controller,
            address,
            on_connect,
            on_ready,
        } = options;

        let controller = match controller.ok_or(Error::MissingController)? {
            Selection::Named(name) => Family::from_name(&name)?.controller(),
            Selection::Family(family) => family.controller(),
            Selection::Custom(controller) => controller,
        };
        let address = address.unwrap_or_else(|| controller.default_address());

        if Active::has(&Filter::address(address)) {
            log::warn!(
                "Expander:{} binds to {:#04x}, which is already in use",
                controller.name(),
                address
            );
        }

        let modes = bus.mode_codes();
        let mut expander = Self {
            bus,
            controller,
            address,
            pins: Pins::default(),
            modes,
            ready: false,
        };

        log::debug!("Expander:{} initializing at {:#04x}", expander.name(), address);
        let (controller, mut ctx) = expander.parts();
        controller.initialize(&mut ctx)?;
        expander.ready = true;

        Active::insert(Registration {
            address,
            controller: expander.name().to_ascii_uppercase(),
        });

        if let Some(f) = on_connect {
            f();
        }
        if let Some(f) = on_ready {
            f();
        }
        Ok(expander)
    }

    fn parts(&mut self) -> (&mut Box<dyn Controller<B>>, Context<'_, B>) {
        (
            &mut self.controller,
            Context {
                bus: &mut self.bus,
                address: self.address,
                pins: &self.pins,
            },
        )
    }

    pub fn pin_mode(&mut self, pin: u8, mode: Mode) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.pin_mode(&mut ctx, pin, mode)
    }

    /// [`Expander::pin_mode()`] with the mode given as a code of the bus's pin framework.
    pub fn pin_mode_code(&mut self, pin: u8, code: u8) -> Result<(), Error> {
        let mode = Mode::from_code(code, &self.modes).ok_or(Error::InvalidMode(code))?;
        self.pin_mode(pin, mode)
    }

    pub fn digital_write(&mut self, pin: u8, value: Level) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.digital_write(&mut ctx, pin, value)
    }

    /// Request the level of `pin`.  `callback` is called once the bus delivers the data, never
    /// from within this call.
    pub fn digital_read<F: FnOnce(Level) + 'static>(&mut self, pin: u8, callback: F) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.digital_read(&mut ctx, pin, Box::new(callback))
    }

    pub fn pull_up(&mut self, pin: u8, value: Level) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.pull_up(&mut ctx, pin, value)
    }

    pub fn normalize(&self, pin: u8) -> u8 {
        self.controller.normalize(pin)
    }

    pub fn analog_read<F: FnOnce(u16) + 'static>(&mut self, pin: u8, callback: F) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.analog_read(&mut ctx, pin, Box::new(callback))
    }

    pub fn analog_write(&mut self, pin: u8, value: u16) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.analog_write(&mut ctx, pin, value)
    }

    pub fn pwm_write(&mut self, pin: u8, value: u16) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.pwm_write(&mut ctx, pin, value)
    }

    pub fn servo_write(&mut self, pin: u8, degrees: u16) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.servo_write(&mut ctx, pin, degrees)
    }

    pub fn i2c_write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.i2c_write(&mut ctx, address, bytes)
    }

    pub fn i2c_read<F: FnOnce(&[u8]) + 'static>(
        &mut self,
        address: u8,
        register: Option<u8>,
        count: usize,
        on_complete: F,
    ) -> Result<(), Error> {
        let (controller, mut ctx) = self.parts();
        controller.i2c_read(&mut ctx, address, register, count, Box::new(on_complete))
    }

    pub fn name(&self) -> &str {
        self.controller.name()
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Mode codes of the pin framework this expander reports to.
    pub fn modes(&self) -> ModeCodes {
        self.modes
    }

    pub fn pins(&self) -> heapless::Vec<PinState, MAX_PINS> {
        self.pins.snapshot()
    }

    pub fn pin(&self, pin: u8) -> Option<PinState> {
        self.pins.get(pin)
    }

    /// Expanders have no analog inputs.
    pub fn analog_pins(&self) -> &[u8] {
        &[]
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: I2cBus> core::fmt::Debug for Expander<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Expander")
            .field("controller", &self.name())
            .field("address", &self.address)
            .field("ready", &self.ready)
            .field("pins", &self.pins)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Active, Capability, DigitalReadCallback, HalBus, I2cExt};
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    /// A four pin chip living entirely in one register at 0x00.
    struct SomeChip {
        out: u8,
        initialized: Rc<Cell<usize>>,
        fail: bool,
    }

    impl SomeChip {
        fn new(initialized: Rc<Cell<usize>>) -> Self {
            Self {
                out: 0,
                initialized,
                fail: false,
            }
        }
    }

    impl<B: I2cBus> Controller<B> for SomeChip {
        fn name(&self) -> &str {
            "some_chip"
        }

        fn default_address(&self) -> u8 {
            0x44
        }

        fn initialize(&mut self, ctx: &mut Context<'_, B>) -> Result<(), Error> {
            self.initialized.set(self.initialized.get() + 1);
            if self.fail {
                return Err(Error::InvalidPin {
                    controller: "SOME_CHIP".into(),
                    pin: 0,
                });
            }
            for _ in 0..4 {
                ctx.pins.push(PinState::digital(Mode::Output))?;
            }
            Ok(())
        }

        fn pin_mode(&mut self, ctx: &mut Context<'_, B>, pin: u8, mode: Mode) -> Result<(), Error> {
            ctx.check_pin("SOME_CHIP", pin)?;
            ctx.pins.update(pin, |p| p.mode = mode);
            Ok(())
        }

        fn digital_write(&mut self, ctx: &mut Context<'_, B>, pin: u8, value: Level) -> Result<(), Error> {
            ctx.check_pin("SOME_CHIP", pin)?;
            self.out = crate::driver::update_bit(self.out, pin, value.is_high());
            ctx.bus.write_reg(ctx.address, 0x00u8, self.out);
            Ok(())
        }

        fn digital_read(
            &mut self,
            ctx: &mut Context<'_, B>,
            pin: u8,
            callback: DigitalReadCallback,
        ) -> Result<(), Error> {
            ctx.check_pin("SOME_CHIP", pin)?;
            ctx.bus.read_reg(
                ctx.address,
                0x00u8,
                Box::new(move |d: &[u8]| callback(Level::from_bit(d[0], pin))),
            );
            Ok(())
        }
    }

    fn quiet_bus() -> (mock_i2c::Mock, HalBus<mock_i2c::Mock>) {
        let expectations: [mock_i2c::Transaction; 0] = [];
        let i2c = mock_i2c::Mock::new(&expectations);
        let bus = HalBus::new(i2c.clone());
        (i2c, bus)
    }

    #[test]
    fn no_controller() {
        let _serial = crate::testing::serial();
        let (mut i2c, bus) = quiet_bus();
        assert_eq!(
            Expander::new(bus, Options::new()).unwrap_err(),
            Error::MissingController
        );
        assert_eq!(Active::len(), 0);
        i2c.done();
    }

    #[test]
    fn unknown_controller() {
        let _serial = crate::testing::serial();
        let (mut i2c, bus) = quiet_bus();
        assert_eq!(
            Expander::new(bus, Options::new().controller("MCP9999")).unwrap_err(),
            Error::InvalidController("MCP9999".into())
        );
        i2c.done();
    }

    #[test]
    fn user_controller() {
        let _serial = crate::testing::serial();
        let initialized = Rc::new(Cell::new(0));
        let (mut i2c, bus) = quiet_bus();

        let exp = Expander::new(bus, Options::new().custom(SomeChip::new(initialized.clone())))
            .unwrap();
        assert_eq!(initialized.get(), 1);
        assert!(exp.is_ready());
        assert_eq!(exp.address(), 0x44);
        assert_eq!(exp.pins().len(), 4);
        assert_eq!(Active::by_address(0x44).unwrap().controller, "SOME_CHIP");

        i2c.done();
    }

    #[test]
    fn virtual_board_surface() {
        let _serial = crate::testing::serial();
        let (mut i2c, bus) = quiet_bus();
        let exp = Expander::new(bus, Options::new().custom(SomeChip::new(Rc::default()))).unwrap();

        assert_eq!(Expander::<HalBus<mock_i2c::Mock>>::HIGH, Level::High);
        assert_eq!(Expander::<HalBus<mock_i2c::Mock>>::LOW, Level::Low);
        assert_eq!(exp.modes(), ModeCodes::default());
        assert!(exp.analog_pins().is_empty());
        for pin in exp.pins() {
            assert_eq!(pin.supported_modes, &[Mode::Input, Mode::Output]);
            assert_eq!(pin.analog_channel, 127);
        }

        i2c.done();
    }

    #[test]
    fn custom_controller_gets_unsupported_guard() {
        let _serial = crate::testing::serial();
        let (mut i2c, bus) = quiet_bus();
        let mut exp = Expander::new(bus, Options::new().custom(SomeChip::new(Rc::default())))
            .unwrap();
        assert_eq!(
            exp.pull_up(0, Level::High).unwrap_err(),
            Error::Unsupported {
                controller: "some_chip".into(),
                capability: Capability::PullUp
            }
        );
        i2c.done();
    }

    #[test]
    fn failed_initialize_is_not_registered() {
        let _serial = crate::testing::serial();
        let initialized = Rc::new(Cell::new(0));
        let mut chip = SomeChip::new(initialized.clone());
        chip.fail = true;
        let (mut i2c, bus) = quiet_bus();

        assert!(Expander::new(bus, Options::new().custom(chip)).is_err());
        assert_eq!(initialized.get(), 1);
        assert_eq!(Active::by_address(0x44), None);

        i2c.done();
    }

    #[test]
    fn connect_then_ready_once() {
        let _serial = crate::testing::serial();
        let events = Rc::new(RefCell::new(Vec::new()));
        let (mut i2c, bus) = quiet_bus();

        let (c, r) = (events.clone(), events.clone());
        let _exp = Expander::new(
            bus,
            Options::new()
                .custom(SomeChip::new(Rc::default()))
                .on_connect(move || c.borrow_mut().push("connect"))
                .on_ready(move || r.borrow_mut().push("ready")),
        )
        .unwrap();
        assert_eq!(*events.borrow(), vec!["connect", "ready"]);

        i2c.done();
    }

    #[test]
    fn registers_by_address() {
        let _serial = crate::testing::serial();
        let expectations: Vec<_> = [
            238, 239, 237, 239, 235, 239, 231, 239, 239, 255, 223, 255, 191, 255, 127, 255, 255,
        ]
        .iter()
        .map(|b| mock_i2c::Transaction::write(0x20, vec![*b]))
        .collect();
        let mut i2c = mock_i2c::Mock::new(&expectations);

        let exp = Expander::new(HalBus::new(i2c.clone()), Options::new().family(Family::Pcf8574))
            .unwrap();

        assert!(Active::has(&Filter::address(0x20)));
        assert!(Active::has(&Filter::controller("PCF8574")));
        assert!(Active::has(&Filter::address(0x20).with_controller("ANOTHER")));
        assert_eq!(
            Active::by_address(0x20),
            Some(Registration {
                address: exp.address(),
                controller: exp.name().into()
            })
        );
        assert_eq!(Active::by_address(0x38), None);
        assert_eq!(Active::by_controller("ANOTHER"), None);

        i2c.done();
    }

    #[test]
    fn double_binding_is_detected_not_blocked() {
        let _serial = crate::testing::serial();
        let (mut i2c, bus) = quiet_bus();
        let (mut i2c2, bus2) = quiet_bus();

        let _a = Expander::new(bus, Options::new().custom(SomeChip::new(Rc::default()))).unwrap();
        assert!(Active::has(&Filter::address(0x44)));
        let _b = Expander::new(bus2, Options::new().custom(SomeChip::new(Rc::default()))).unwrap();
        assert_eq!(Active::len(), 1);

        i2c.done();
        i2c2.done();
    }

    #[test]
    fn mode_codes_follow_the_bus() {
        let _serial = crate::testing::serial();
        let expectations: [mock_i2c::Transaction; 0] = [];
        let mut i2c = mock_i2c::Mock::new(&expectations);
        let bus = HalBus::with_mode_codes(
            i2c.clone(),
            ModeCodes {
                input: 0x10,
                output: 0x11,
            },
        );

        let mut exp = Expander::new(bus, Options::new().custom(SomeChip::new(Rc::default())))
            .unwrap();
        exp.pin_mode_code(1, 0x10).unwrap();
        assert_eq!(exp.pin(1).unwrap().mode, Mode::Input);
        exp.pin_mode_code(1, 0x11).unwrap();
        assert_eq!(exp.pin(1).unwrap().mode, Mode::Output);
        assert_eq!(exp.pin_mode_code(1, 0x01), Err(Error::InvalidMode(0x01)));
        assert_eq!(exp.pin(1).unwrap().mode, Mode::Output);

        i2c.done();
    }

    #[test]
    fn reads_complete_later() {
        let _serial = crate::testing::serial();
        let expectations = [
            mock_i2c::Transaction::write(0x45, vec![0x00, 0x04]),
            mock_i2c::Transaction::write_read(0x45, vec![0x00], vec![0x04]),
        ];
        let mut i2c = mock_i2c::Mock::new(&expectations);

        let mut exp = Expander::new(
            HalBus::new(i2c.clone()),
            Options::new().custom(SomeChip::new(Rc::default())).address(0x45),
        )
        .unwrap();
        exp.digital_write(2, Level::High).unwrap();

        let got = Rc::new(Cell::new(None));
        let g = got.clone();
        exp.digital_read(2, move |v| g.set(Some(v))).unwrap();
        assert_eq!(got.get(), None);

        exp.bus_mut().poll().unwrap();
        assert_eq!(got.get(), Some(Level::High));

        i2c.done();
    }
}
