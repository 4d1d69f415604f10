//! Node configuration.

use core::fmt;

use hal::can::{CanFdConfig, ChannelId, MAX_FD_PAYLOAD};
use hal::error::{HalError, HalResult};
use hal::interrupt::{InterruptPriority, IrqNumber};
use heapless::Vec;

/// Identity of a node on the bus; doubles as the outbound message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(pub u16);

impl NodeId {
    pub const fn as_raw(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub const NODE_1: NodeId = NodeId(1);
/// Use on the second device of a two-node bus.
pub const NODE_2: NodeId = NodeId(2);

pub const DEFAULT_CHANNEL: ChannelId = ChannelId(0);
pub const DEFAULT_TX_BUFFER_INDEX: u8 = 0;
pub const DEFAULT_CAN_IRQ: IrqNumber = 0;
pub const DEFAULT_CAN_IRQ_PRIORITY: InterruptPriority = 1;
pub const DEFAULT_BUTTON_PRIORITY: InterruptPriority = 7;

/// Payload carried by every outbound frame unless configured otherwise.
pub const DEFAULT_TX_PAYLOAD: [u8; 8] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];

/// Static configuration of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub channel: ChannelId,
    pub tx_buffer_index: u8,
    pub can_irq: IrqNumber,
    pub can_irq_priority: InterruptPriority,
    pub button_priority: InterruptPriority,
    pub tx_payload: Vec<u8, MAX_FD_PAYLOAD>,
    pub bus: CanFdConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: NODE_1,
            channel: DEFAULT_CHANNEL,
            tx_buffer_index: DEFAULT_TX_BUFFER_INDEX,
            can_irq: DEFAULT_CAN_IRQ,
            can_irq_priority: DEFAULT_CAN_IRQ_PRIORITY,
            button_priority: DEFAULT_BUTTON_PRIORITY,
            tx_payload: Vec::from_slice(&DEFAULT_TX_PAYLOAD).unwrap_or_default(),
            bus: CanFdConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Creates a new node configuration builder.
    pub fn builder() -> NodeConfigBuilder {
        NodeConfigBuilder::default()
    }
}

/// Builder for ergonomic node configuration construction.
#[derive(Debug, Clone, Default)]
pub struct NodeConfigBuilder {
    config: NodeConfig,
}

impl NodeConfigBuilder {
    /// Sets the node identity.
    pub fn node_id(mut self, id: NodeId) -> Self {
        self.config.node_id = id;
        self
    }

    /// Sets the controller channel.
    pub fn channel(mut self, channel: ChannelId) -> Self {
        self.config.channel = channel;
        self
    }

    /// Sets the dedicated transmit buffer used for outbound frames.
    pub fn tx_buffer_index(mut self, index: u8) -> Self {
        self.config.tx_buffer_index = index;
        self
    }

    /// Sets the controller interrupt line and its priority.
    pub fn can_irq(mut self, irq: IrqNumber, priority: InterruptPriority) -> Self {
        self.config.can_irq = irq;
        self.config.can_irq_priority = priority;
        self
    }

    /// Sets the button edge interrupt priority.
    pub fn button_priority(mut self, priority: InterruptPriority) -> Self {
        self.config.button_priority = priority;
        self
    }

    /// Sets the outbound payload.
    ///
    /// Fails with [`HalError::InvalidParameter`] for payloads longer than an
    /// FD frame can carry. Whether the length is encodable for the configured
    /// frame format is checked by `startup`.
    pub fn tx_payload(mut self, payload: &[u8]) -> HalResult<Self> {
        self.config.tx_payload = Vec::from_slice(payload).map_err(|_| HalError::InvalidParameter)?;
        Ok(self)
    }

    /// Sets the controller channel configuration.
    pub fn bus(mut self, bus: CanFdConfig) -> Self {
        self.config.bus = bus;
        self
    }

    /// Builds the node configuration.
    pub fn build(self) -> NodeConfig {
        self.config
    }
}
