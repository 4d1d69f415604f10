//! Main dispatch loop.
//!
//! Two states, derived from the transmit-pending signal: `Idle` and
//! `PendingSend`. The button handler moves the loop to `PendingSend`
//! asynchronously; [`Dispatcher::poll_once`] moves it back after exactly one
//! transmit attempt.

use hal::can::{CanFdController, RxCallback};
use hal::console::Console;
use hal::console_line;

use crate::signal::PendingSignal;
use crate::tx::{TransmitPath, TxOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    Idle,
    PendingSend,
}

/// Cooperative loop consuming the transmit-pending signal.
pub struct Dispatcher<'a, S: PendingSignal, C: CanFdController, R, L> {
    signal: &'a S,
    tx: TransmitPath<'a, C, R>,
    console: L,
    attempts: u32,
}

impl<'a, S, C, R, L> Dispatcher<'a, S, C, R, L>
where
    S: PendingSignal,
    C: CanFdController,
    R: RxCallback,
    L: Console,
{
    pub fn new(signal: &'a S, tx: TransmitPath<'a, C, R>, console: L) -> Self {
        Self {
            signal,
            tx,
            console,
            attempts: 0,
        }
    }

    pub fn state(&self) -> DispatchState {
        if self.signal.is_pending() {
            DispatchState::PendingSend
        } else {
            DispatchState::Idle
        }
    }

    /// Transmit attempts made since construction.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// One loop iteration.
    ///
    /// In `PendingSend`: transmits, logs the outcome, clears the signal and
    /// returns the outcome. In `Idle`: returns `None` without side effects.
    pub fn poll_once(&mut self) -> Option<TxOutcome> {
        if self.state() == DispatchState::Idle {
            return None;
        }

        let outcome = self.tx.transmit();
        self.attempts = self.attempts.wrapping_add(1);

        let id = self.tx.identity();
        match outcome {
            TxOutcome::Sent => {
                console_line!(self.console, "CAN-FD Frame sent with message ID-{}", id);
            }
            TxOutcome::SendFailed(err) => {
                console_line!(self.console, "Error sending CAN-FD Frame with message ID-{}", id);
                log::warn!("transmit failed: {}", err);
            }
        }

        // The press is handled whether or not the controller accepted it
        self.signal.clear();
        log::debug!("dispatch: PendingSend -> Idle");

        Some(outcome)
    }

    /// Runs the loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.signal.wait();
            self.poll_once();
        }
    }
}
