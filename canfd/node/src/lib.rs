#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # canfd-node
//!
//! Interrupt-driven message exchange for a single CAN FD bus node. A button
//! press requests one outbound frame carrying the node identity; frames sent
//! by other nodes are decoded at interrupt level, toggle an indicator and are
//! logged to the debug console.
//!
//! ## Module Overview
//! - [`config`]   – Node identity, channel and interrupt configuration.
//! - [`frame`]    – Receive codec and per-send outbound frame builder.
//! - [`signal`]   – The transmit-pending signal shared with interrupt level.
//! - [`channel`]  – Controller, driver context and receive sink behind one
//!   critical-section cell.
//! - [`tx`]       – Transmit request path.
//! - [`rx`]       – Receive notification sink.
//! - [`bridge`]   – Button and controller interrupt handlers.
//! - [`dispatch`] – Cooperative main dispatch loop.
//! - [`fault`]    – Setup error vocabulary and the halt policy.
//! - [`node`]     – Board capability surface and the startup sequence.

pub mod bridge;
pub mod channel;
pub mod config;
pub mod dispatch;
pub mod fault;
pub mod frame;
pub mod node;
pub mod rx;
pub mod signal;
pub mod tx;

pub use bridge::{ButtonIrq, CanIrq};
pub use channel::{CanChannel, SharedChannel};
pub use config::{NodeConfig, NodeConfigBuilder, NodeId, NODE_1, NODE_2};
pub use dispatch::{DispatchState, Dispatcher};
pub use fault::{escalate, Halt, SetupError, SpinHalt};
pub use frame::{decode, DecodedFrame, FrameTemplate, RxOutcome, TxFrameBuilder};
pub use node::{run, startup, Board, Node, NodeChannel};
pub use rx::RxSink;
pub use signal::{PendingSignal, TransmitPending};
pub use tx::{TransmitPath, TxOutcome};

#[cfg(test)]
mod tests;
