//! Controller channel shared between the dispatch loop and interrupt level.
//!
//! The driver context is touched by the transmit path and by the controller
//! interrupt. Both go through [`SharedChannel::with`], which runs the access
//! inside a critical section; the receive sink registered at setup travels
//! with the controller so the interrupt handler needs nothing else.

use core::cell::RefCell;

use critical_section::Mutex;
use hal::can::{CanFdController, ChannelId, RxCallback, TxFrame};
use hal::error::HalResult;

/// An initialized controller channel with its registered receive sink.
pub struct CanChannel<C: CanFdController, R> {
    controller: C,
    channel: ChannelId,
    context: C::Context,
    rx: R,
}

impl<C: CanFdController, R: RxCallback> CanChannel<C, R> {
    /// Initializes `channel` on `controller` and registers `rx` for its
    /// receive notifications.
    pub fn open(
        mut controller: C,
        channel: ChannelId,
        config: &hal::can::CanFdConfig,
        rx: R,
    ) -> HalResult<Self> {
        let context = controller.init(channel, config)?;
        Ok(Self {
            controller,
            channel,
            context,
            rx,
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Submits `frame` to transmit buffer `buffer_index`.
    pub fn transmit(&mut self, frame: &TxFrame, buffer_index: u8) -> HalResult<()> {
        self.controller
            .update_and_transmit(self.channel, frame, buffer_index, &mut self.context)
    }

    /// Runs the controller's interrupt dispatch with the registered sink.
    pub fn service_irq(&mut self) {
        self.controller
            .irq_dispatch(self.channel, &mut self.context, &mut self.rx);
    }

    pub fn rx(&self) -> &R {
        &self.rx
    }
}

/// Critical-section cell holding the channel once startup installed it.
pub struct SharedChannel<C: CanFdController, R> {
    inner: Mutex<RefCell<Option<CanChannel<C, R>>>>,
}

impl<C: CanFdController, R: RxCallback> SharedChannel<C, R> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Installs an opened channel, returning the one it replaces.
    pub fn install(&self, channel: CanChannel<C, R>) -> Option<CanChannel<C, R>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(channel))
    }

    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Runs `f` on the channel inside a critical section.
    ///
    /// Returns `None` when no channel has been installed yet.
    pub fn with<T>(&self, f: impl FnOnce(&mut CanChannel<C, R>) -> T) -> Option<T> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<C: CanFdController, R: RxCallback> Default for SharedChannel<C, R> {
    fn default() -> Self {
        Self::new()
    }
}
