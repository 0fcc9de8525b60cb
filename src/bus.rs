use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec;

/// Completion handler for a bus read.  Receives the bytes returned by the device.
pub type ReadComplete = Box<dyn FnOnce(&[u8])>;

/// Numeric mode codes of the pin framework the expander is plugged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCodes {
    pub input: u8,
    pub output: u8,
}

impl Default for ModeCodes {
    /// Firmata numbering.
    fn default() -> Self {
        Self {
            input: 0x00,
            output: 0x01,
        }
    }
}

/// The two-wire bus collaborator every expander talks through.
///
/// Writes are fire-and-forget.  Reads are asynchronous: `i2c_read` only issues the transfer and the
/// bus calls `on_complete` exactly once when the data arrives, never from within `i2c_read` itself.
pub trait I2cBus {
    /// One-time bus setup.
    fn i2c_config(&mut self);

    /// Write `bytes` to the device at `address`.  Either a single byte or `[register, value]`.
    fn i2c_write(&mut self, address: u8, bytes: &[u8]);

    /// Read `count` bytes from `address`, starting at `register` when the device has addressable
    /// registers.
    fn i2c_read(&mut self, address: u8, register: Option<u8>, count: usize, on_complete: ReadComplete);

    fn mode_codes(&self) -> ModeCodes {
        ModeCodes::default()
    }
}

pub(crate) trait I2cExt {
    fn write_reg<R: Into<u8>>(&mut self, addr: u8, reg: R, value: u8);
    fn write_byte(&mut self, addr: u8, value: u8);
    fn read_reg<R: Into<u8>>(&mut self, addr: u8, reg: R, on_complete: ReadComplete);
    fn read_byte(&mut self, addr: u8, on_complete: ReadComplete);
}

impl<B: I2cBus + ?Sized> I2cExt for B {
    fn write_reg<R: Into<u8>>(&mut self, addr: u8, reg: R, value: u8) {
        let reg = reg.into();
        log::trace!("i2c {:#04x}: reg {:#04x} <- {:#010b}", addr, reg, value);
        self.i2c_write(addr, &[reg, value]);
    }

    fn write_byte(&mut self, addr: u8, value: u8) {
        log::trace!("i2c {:#04x}: <- {:#010b}", addr, value);
        self.i2c_write(addr, &[value]);
    }

    fn read_reg<R: Into<u8>>(&mut self, addr: u8, reg: R, on_complete: ReadComplete) {
        self.i2c_read(addr, Some(reg.into()), 1, on_complete);
    }

    fn read_byte(&mut self, addr: u8, on_complete: ReadComplete) {
        self.i2c_read(addr, None, 1, on_complete);
    }
}

struct PendingRead {
    address: u8,
    register: Option<u8>,
    count: usize,
    on_complete: ReadComplete,
}

/// [`I2cBus`] on top of a blocking `embedded-hal` I2C peripheral.
///
/// Writes go out immediately.  Reads are queued and only performed by [`HalBus::poll()`], which
/// keeps completions out of the call that issued them.
pub struct HalBus<I2C: embedded_hal::i2c::I2c> {
    i2c: I2C,
    pending: VecDeque<PendingRead>,
    last_error: Option<I2C::Error>,
    modes: ModeCodes,
}

impl<I2C: embedded_hal::i2c::I2c> HalBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_mode_codes(i2c, ModeCodes::default())
    }

    pub fn with_mode_codes(i2c: I2C, modes: ModeCodes) -> Self {
        Self {
            i2c,
            pending: VecDeque::new(),
            last_error: None,
            modes,
        }
    }

    /// Number of reads waiting for [`HalBus::poll()`].
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Perform all queued reads and fire their completions in issue order.
    ///
    /// Stops at the first failing transfer; that read's completion is dropped and the reads
    /// behind it stay queued.
    pub fn poll(&mut self) -> Result<usize, I2C::Error> {
        let mut done = 0;
        while let Some(read) = self.pending.pop_front() {
            let mut buf = vec![0x00; read.count];
            match read.register {
                Some(reg) => self.i2c.write_read(read.address, &[reg], &mut buf)?,
                None => self.i2c.read(read.address, &mut buf)?,
            }
            (read.on_complete)(&buf);
            done += 1;
        }
        Ok(done)
    }

    /// The most recent failed write, if any.
    pub fn take_error(&mut self) -> Option<I2C::Error> {
        self.last_error.take()
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: embedded_hal::i2c::I2c> I2cBus for HalBus<I2C> {
    fn i2c_config(&mut self) {
        log::debug!("i2c bus configured");
    }

    fn i2c_write(&mut self, address: u8, bytes: &[u8]) {
        if let Err(e) = self.i2c.write(address, bytes) {
            log::warn!("i2c write to {:#04x} failed: {:?}", address, e);
            self.last_error = Some(e);
        }
    }

    fn i2c_read(&mut self, address: u8, register: Option<u8>, count: usize, on_complete: ReadComplete) {
        self.pending.push_back(PendingRead {
            address,
            register,
            count,
            on_complete,
        });
    }

    fn mode_codes(&self) -> ModeCodes {
        self.modes
    }
}
