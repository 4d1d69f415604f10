//! Hardware Abstraction Layer (HAL) for the CAN FD node
//!
//! This crate provides vendor-agnostic traits for the peripherals a bus node
//! consumes: GPIO with edge interrupts, an interrupt controller, a debug
//! console and a CAN FD controller driver. Board support crates and the
//! hosted port implement them; the node logic only sees the traits.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

pub mod can;
pub mod console;
pub mod error;
pub mod gpio;
pub mod interrupt;

// Re-export commonly used types
pub use can::{CanFdConfig, CanFdController, ChannelId, FrameKind, RxCallback, RxRecord, TxFrame};
pub use console::Console;
pub use error::{HalError, HalResult};
