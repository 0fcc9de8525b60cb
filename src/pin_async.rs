//! Future-based digital reads.
//!
//! Only built with the `"async"` feature.  [`Expander::read()`] issues the same bus read as
//! [`Expander::digital_read()`] but hands back a [`ReadFuture`] instead of taking a callback.  The
//! future resolves once the bus delivers the data, so whoever drives the bus (for
//! [`HalBus`][crate::HalBus], calling `poll()`) must keep doing so while the future is awaited.
use alloc::rc::Rc;
use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};

use crate::{Error, Expander, I2cBus, Level};

#[derive(Debug, Default)]
struct Slot {
    level: Option<Level>,
    waker: Option<Waker>,
}

/// Level of one pin, available once its read completes.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct ReadFuture {
    slot: Rc<RefCell<Slot>>,
}

impl ReadFuture {
    /// Whether the read already completed.
    pub fn is_complete(&self) -> bool {
        self.slot.borrow().level.is_some()
    }
}

impl Future for ReadFuture {
    type Output = Level;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Level> {
        let mut slot = self.slot.borrow_mut();
        match slot.level {
            Some(level) => Poll::Ready(level),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<B: I2cBus> Expander<B> {
    /// Read `pin` and await its level.
    pub fn read(&mut self, pin: u8) -> Result<ReadFuture, Error> {
        let slot = Rc::new(RefCell::new(Slot::default()));

        let completion = slot.clone();
        self.digital_read(pin, move |level| {
            let waker = {
                let mut slot = completion.borrow_mut();
                slot.level = Some(level);
                slot.waker.take()
            };
            if let Some(waker) = waker {
                waker.wake();
            }
        })?;

        Ok(ReadFuture { slot })
    }
}
