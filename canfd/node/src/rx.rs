//! Receive notification sink.
//!
//! Runs at interrupt level from inside the controller's dispatch routine.
//! Everything here is bounded: one fixed-size copy, one GPIO write and two
//! console lines per frame.

use core::fmt;

use hal::can::{RxCallback, RxRecord};
use hal::console::Console;
use hal::console_line;
use hal::gpio::GpioPin;

use crate::frame::{decode, DecodedFrame, RxOutcome};

/// Toggles the indicator and logs every decoded data frame.
pub struct RxSink<P, L> {
    indicator: P,
    console: L,
    received: u32,
}

impl<P: GpioPin, L: Console> RxSink<P, L> {
    pub fn new(indicator: P, console: L) -> Self {
        Self {
            indicator,
            console,
            received: 0,
        }
    }

    /// Number of data frames decoded so far.
    pub fn received(&self) -> u32 {
        self.received
    }

    pub fn indicator(&self) -> &P {
        &self.indicator
    }

    fn indicate(&mut self, frame: &DecodedFrame) {
        self.received = self.received.wrapping_add(1);

        if let Err(err) = self.indicator.toggle() {
            log::warn!("indicator toggle failed: {}", err);
        }

        console_line!(
            self.console,
            "{} bytes received with message identifier {}",
            frame.len(),
            frame.id
        );
        console_line!(self.console, "Rx Data :{}", PayloadBytes(&frame.payload));
    }
}

impl<P: GpioPin, L: Console> RxCallback for RxSink<P, L> {
    fn on_receive(&mut self, valid: bool, fifo: u8, record: &RxRecord<'_>) {
        match decode(valid, record) {
            RxOutcome::Decoded(frame) => {
                log::debug!("fifo {} delivered id {}", fifo, frame.id);
                self.indicate(&frame);
            }
            RxOutcome::Ignored => {}
        }
    }
}

/// Payload bytes in decimal, each preceded by one space.
struct PayloadBytes<'a>(&'a [u8]);

impl fmt::Display for PayloadBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, " {}", byte)?;
        }
        Ok(())
    }
}
