//! Interrupt bridge.
//!
//! The two handlers a board binds to its vector table. Both are O(1) on the
//! bridge side: the button handler only raises the transmit-pending signal,
//! the controller handler only forwards into the driver's dispatch routine.
//!
//! ```ignore
//! static SIGNAL: TransmitPending = TransmitPending::new();
//! static CHANNEL: NodeChannel<MyBoard> = SharedChannel::new();
//!
//! #[interrupt]
//! fn CANFD0() {
//!     CanIrq::new(&CHANNEL).on_interrupt();
//! }
//!
//! #[interrupt]
//! fn GPIO_BUTTON() {
//!     ButtonIrq::new(&SIGNAL).on_falling_edge();
//! }
//! ```

use hal::can::{CanFdController, RxCallback};

use crate::channel::SharedChannel;
use crate::signal::PendingSignal;

/// Button falling-edge handler.
pub struct ButtonIrq<'a, S: PendingSignal> {
    signal: &'a S,
}

impl<'a, S: PendingSignal> ButtonIrq<'a, S> {
    pub const fn new(signal: &'a S) -> Self {
        Self { signal }
    }

    #[inline]
    pub fn on_falling_edge(&self) {
        self.signal.raise();
    }
}

/// Controller interrupt line handler.
pub struct CanIrq<'a, C: CanFdController, R> {
    channel: &'a SharedChannel<C, R>,
}

impl<'a, C: CanFdController, R: RxCallback> CanIrq<'a, C, R> {
    pub const fn new(channel: &'a SharedChannel<C, R>) -> Self {
        Self { channel }
    }

    pub fn on_interrupt(&self) {
        // Lines can fire between being enabled and the channel being installed
        if self.channel.with(|channel| channel.service_irq()).is_none() {
            log::debug!("controller interrupt before channel install");
        }
    }
}
