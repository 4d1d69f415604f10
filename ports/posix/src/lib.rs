//! Hosted port of the CAN FD node for Linux/Unix systems.
//!
//! Everything a board would provide is simulated in-process: an interrupt
//! controller whose lines are serviced on a dedicated thread, GPIO for the
//! indicator and the button, and a CAN FD controller attached to a virtual
//! bus shared by any number of nodes. Critical sections map onto the
//! `critical-section` crate's `std` implementation.
//!
//! ## Module Overview
//! - [`irq`]        – Interrupt hub and its `InterruptController` face.
//! - [`gpio`]       – Simulated indicator LED and push button.
//! - [`bus`]        – Virtual broadcast medium.
//! - [`controller`] – Simulated CAN FD controller driver.
//! - [`signal`]     – Condvar-backed transmit-pending signal.
//! - [`console`]    – Stdout and in-memory consoles.
//! - [`logger`]     – `log` backend writing to stderr.
//! - [`board`]      – `Board` implementation tying the above together.
//! - [`node`]       – A started node with its interrupt vectors bound.

#![forbid(unsafe_code)]

use hal::interrupt::IrqNumber;

pub mod board;
pub mod bus;
pub mod console;
pub mod controller;
pub mod gpio;
pub mod irq;
pub mod logger;
pub mod node;
pub mod signal;

pub use board::{SimBoard, BUTTON_IRQ};
pub use bus::{PortId, VirtualBus};
pub use console::SimConsole;
pub use controller::{FaultInjection, SimContext, SimController};
pub use gpio::{SimButton, SimLed};
pub use irq::{InterruptHub, SimInterruptController};
pub use node::{ExitHalt, SimNode};
pub use signal::BlockingSignal;

/// Errors raised while assembling a hosted node.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("node setup failed: {0}")]
    Setup(#[from] canfd_node::SetupError),

    #[error("interrupt line {0} already has a handler")]
    LineInUse(IrqNumber),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("logger already installed: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type SimResult<T> = Result<T, SimError>;
