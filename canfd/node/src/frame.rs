//! Frame codec and outbound frame construction.
//!
//! Receive side: [`decode`] turns a hardware receive element into either a
//! [`DecodedFrame`] owning a copy of its payload, or [`RxOutcome::Ignored`].
//! It never fails.
//!
//! Transmit side: [`FrameTemplate`] holds the immutable parts of the outbound
//! frame. Every send starts from a fresh [`TxFrameBuilder`], so nothing from a
//! previous transmission leaks into the next.

use hal::can::{FrameKind, RxRecord, TxFrame, MAX_FD_PAYLOAD};
use hal::error::{HalError, HalResult};
use heapless::Vec;

use crate::config::{NodeConfig, NodeId};

/// Bytes this node retains from one received frame.
pub const RX_CAPACITY: usize = 8;

/// Owned copy of a received payload.
pub type Payload = Vec<u8, RX_CAPACITY>;

/// A received data frame copied out of the controller's message RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedFrame {
    pub id: u32,
    pub payload: Payload,
}

impl DecodedFrame {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Result of decoding one receive element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxOutcome {
    Decoded(DecodedFrame),
    Ignored,
}

/// Decodes a receive element delivered by the controller.
///
/// Faulty receptions and remote frames are ignored. Data frames announcing
/// more than [`RX_CAPACITY`] bytes, or whose data area is shorter than their
/// DLC claims, lie outside the receive element contract and are ignored too.
pub fn decode(valid: bool, record: &RxRecord<'_>) -> RxOutcome {
    if !valid {
        return RxOutcome::Ignored;
    }
    if record.kind == FrameKind::Remote {
        return RxOutcome::Ignored;
    }

    let len = record.len();
    if len > RX_CAPACITY {
        log::debug!("dropping frame {:#x}: {} bytes exceed receive capacity", record.id, len);
        return RxOutcome::Ignored;
    }

    let Some(Ok(payload)) = record.data.get(..len).map(Payload::from_slice) else {
        log::debug!("dropping frame {:#x}: data area shorter than dlc", record.id);
        return RxOutcome::Ignored;
    };

    RxOutcome::Decoded(DecodedFrame {
        id: record.id,
        payload,
    })
}

/// Immutable description of the outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTemplate {
    payload: Vec<u8, MAX_FD_PAYLOAD>,
    fd_format: bool,
    bit_rate_switch: bool,
}

impl FrameTemplate {
    pub fn new(payload: &[u8], fd_format: bool, bit_rate_switch: bool) -> HalResult<Self> {
        let payload = Vec::from_slice(payload).map_err(|_| HalError::InvalidParameter)?;
        Ok(Self {
            payload,
            fd_format,
            bit_rate_switch: fd_format && bit_rate_switch,
        })
    }

    /// Template matching the node configuration.
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            payload: config.tx_payload.clone(),
            fd_format: config.bus.fd_enabled,
            bit_rate_switch: config.bus.fd_enabled && config.bus.bit_rate_switch,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Starts a fresh builder seeded from this template.
    pub fn builder(&self) -> TxFrameBuilder {
        TxFrameBuilder {
            id: None,
            payload: self.payload.clone(),
            fd_format: self.fd_format,
            bit_rate_switch: self.bit_rate_switch,
        }
    }
}

/// Per-transmission builder for a [`TxFrame`].
#[derive(Debug, Clone)]
pub struct TxFrameBuilder {
    id: Option<u32>,
    payload: Vec<u8, MAX_FD_PAYLOAD>,
    fd_format: bool,
    bit_rate_switch: bool,
}

impl TxFrameBuilder {
    /// Fills the identifier slot with the node identity.
    pub fn identity(mut self, node: NodeId) -> Self {
        self.id = Some(node.as_raw());
        self
    }

    /// Builds and validates the frame; the identifier slot must be filled.
    pub fn build(self) -> HalResult<TxFrame> {
        let id = self.id.ok_or(HalError::InvalidParameter)?;
        let frame = TxFrame {
            id,
            extended: false,
            kind: FrameKind::Data,
            fd_format: self.fd_format,
            bit_rate_switch: self.bit_rate_switch,
            data: self.payload,
        };
        frame.validate()?;
        Ok(frame)
    }
}
