//! Tests for NodeConfig builder and defaults.

use canfd_node::config::{DEFAULT_TX_PAYLOAD, NODE_2};
use canfd_node::{FrameTemplate, NodeConfig, NodeId, NODE_1};
use hal::can::{CanFdConfig, ChannelId};
use hal::error::HalError;

#[test]
fn node_config_default() {
    let config = NodeConfig::default();

    assert_eq!(config.node_id, NODE_1);
    assert_eq!(config.channel, ChannelId(0));
    assert_eq!(config.tx_buffer_index, 0);
    assert_eq!(config.can_irq_priority, 1);
    assert_eq!(config.button_priority, 7);
    assert_eq!(config.tx_payload.as_slice(), &DEFAULT_TX_PAYLOAD);
    assert_eq!(config.bus, CanFdConfig::default());
}

#[test]
fn node_config_builder() {
    let bus = CanFdConfig {
        nominal_bitrate: 1_000_000,
        data_bitrate: 5_000_000,
        ..CanFdConfig::default()
    };
    let config = NodeConfig::builder()
        .node_id(NODE_2)
        .channel(ChannelId(1))
        .tx_buffer_index(3)
        .can_irq(42, 2)
        .button_priority(5)
        .tx_payload(&[9, 8, 7])
        .unwrap()
        .bus(bus.clone())
        .build();

    assert_eq!(config.node_id, NodeId(2));
    assert_eq!(config.channel, ChannelId(1));
    assert_eq!(config.tx_buffer_index, 3);
    assert_eq!(config.can_irq, 42);
    assert_eq!(config.can_irq_priority, 2);
    assert_eq!(config.button_priority, 5);
    assert_eq!(config.tx_payload.as_slice(), &[9, 8, 7]);
    assert_eq!(config.bus, bus);
}

#[test]
fn oversized_payload_is_rejected() {
    assert_eq!(
        NodeConfig::builder().tx_payload(&[7; 70]).err(),
        Some(HalError::InvalidParameter)
    );

    let config = NodeConfig::builder().tx_payload(&[1; 64]).unwrap().build();
    assert_eq!(config.tx_payload.len(), 64);
}

#[test]
fn classic_bus_disables_bit_rate_switch_in_template() {
    let config = NodeConfig::builder()
        .bus(CanFdConfig {
            fd_enabled: false,
            bit_rate_switch: true,
            ..CanFdConfig::default()
        })
        .build();

    let frame = FrameTemplate::from_config(&config)
        .builder()
        .identity(NODE_1)
        .build()
        .unwrap();
    assert!(!frame.fd_format);
    assert!(!frame.bit_rate_switch);
}

#[test]
fn node_id_displays_as_number() {
    assert_eq!(NODE_2.to_string(), "2");
    assert_eq!(NODE_2.as_raw(), 2);
}
