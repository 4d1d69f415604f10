use std::panic::{catch_unwind, AssertUnwindSafe};

use hal::can::CanFdConfig;
use hal::error::HalError;
use hal::gpio::{Edge, Level, PinMode};

use super::mocks::{FailAt, MockBoard, PanicHalt, RxElement};
use crate::bridge::{ButtonIrq, CanIrq};
use crate::config::{NodeConfig, NodeId, NODE_1};
use crate::fault::{escalate, SetupError};
use crate::node::{run, startup, NodeChannel};
use crate::signal::{PendingSignal, TransmitPending};
use crate::tx::TxOutcome;

#[test]
fn startup_prints_banner_and_configures_peripherals() {
    let mut board = MockBoard::default();
    let signal = TransmitPending::new();
    let channel = NodeChannel::<MockBoard>::new();
    let config = NodeConfig::builder().node_id(NODE_1).can_irq(5, 1).build();

    let node = startup(&mut board, config, &signal, &channel).unwrap();

    assert_eq!(node.config().node_id, NODE_1);
    assert!(channel.is_installed());
    assert_eq!(
        board.console.lines(),
        vec![
            "===========================================================",
            "Welcome to CAN-FD example",
            "===========================================================",
            "===========================================================",
            "CAN-FD Node-1 (message id)",
            "===========================================================",
        ]
    );
    assert_eq!(board.interrupts.priorities(), vec![(5, 1)]);
    assert_eq!(board.interrupts.enabled(), vec![5]);
    assert!(board.interrupts.global_enabled());
    assert_eq!(board.indicator.mode(), Some(PinMode::Output));
    assert_eq!(board.indicator.level(), Level::Low);
    assert_eq!(board.button.mode(), Some(PinMode::InputPullUp));
    assert_eq!(board.button.edge(), Some((Edge::Falling, 7)));
    assert!(board.controller.state().initialized.is_some());
}

#[test]
fn each_setup_step_reports_its_own_error() {
    let cases = [
        (FailAt::Init, SetupError::Board(HalError::HardwareError)),
        (FailAt::Console, SetupError::Console(HalError::HardwareError)),
        (FailAt::Interrupts, SetupError::Interrupt(HalError::HardwareError)),
        (FailAt::Indicator, SetupError::Indicator(HalError::HardwareError)),
        (FailAt::Button, SetupError::Button(HalError::HardwareError)),
        (FailAt::Controller, SetupError::Controller(HalError::Timeout)),
    ];

    for (step, expected) in cases {
        let mut board = MockBoard::failing_at(step);
        let signal = TransmitPending::new();
        let channel = NodeChannel::<MockBoard>::new();
        let result = startup(&mut board, NodeConfig::default(), &signal, &channel);
        let err = result.err();
        assert_eq!(err, Some(expected), "{step:?}");
        assert_eq!(err.map(|err| err.cause()), Some(expected.cause()));
        assert!(!channel.is_installed());
    }
}

#[test]
fn unsendable_outbound_frame_fails_before_any_peripheral() {
    let classic = CanFdConfig {
        fd_enabled: false,
        bit_rate_switch: false,
        ..CanFdConfig::default()
    };
    let configs = [
        // 10 bytes has no DLC code
        NodeConfig::builder().tx_payload(&[0; 10]).unwrap().build(),
        // Outside the standard identifier range
        NodeConfig::builder().node_id(NodeId(0x800)).build(),
        // Over 8 bytes on a classic channel
        NodeConfig::builder()
            .bus(classic)
            .tx_payload(&[0; 12])
            .unwrap()
            .build(),
    ];

    for config in configs {
        let mut board = MockBoard::default();
        let signal = TransmitPending::new();
        let channel = NodeChannel::<MockBoard>::new();
        let result = startup(&mut board, config.clone(), &signal, &channel);

        assert_eq!(
            result.err(),
            Some(SetupError::Frame(HalError::InvalidParameter)),
            "{config:?}"
        );
        assert!(board.console.lines().is_empty());
        assert!(board.controller.state().initialized.is_none());
        assert!(!channel.is_installed());
    }
}

#[test]
fn escalate_passes_success_through() {
    let value: Result<u8, SetupError> = Ok(3);
    assert_eq!(escalate(value, &PanicHalt), 3);
}

#[test]
fn setup_failure_halts_before_dispatch() {
    let mut board = MockBoard::failing_at(FailAt::Controller);
    let signal = TransmitPending::new();
    let channel = NodeChannel::<MockBoard>::new();
    // A press already pending must never be served
    signal.raise();

    let result = catch_unwind(AssertUnwindSafe(|| {
        run(&mut board, NodeConfig::default(), &signal, &channel, &PanicHalt)
    }));

    let payload = result.unwrap_err();
    let message = payload.downcast_ref::<String>().unwrap();
    assert!(message.starts_with("halted: CAN FD controller init failed"));
    assert_eq!(board.controller.state().attempts, 0);
    assert_eq!(board.console.count_containing("CAN-FD Frame"), 0);
    assert!(signal.is_pending());
}

#[test]
fn end_to_end_node_one() {
    let mut board = MockBoard::default();
    let signal = TransmitPending::new();
    let channel = NodeChannel::<MockBoard>::new();
    let mut node = startup(&mut board, NodeConfig::default(), &signal, &channel).unwrap();
    board.console.clear();

    // Press with a healthy controller
    ButtonIrq::new(&signal).on_falling_edge();
    assert_eq!(node.poll_once(), Some(TxOutcome::Sent));
    assert!(!signal.is_pending());

    // Press with a controller rejecting the submission
    board.controller.reject_with(Some(HalError::BusOff));
    ButtonIrq::new(&signal).on_falling_edge();
    assert_eq!(node.poll_once(), Some(TxOutcome::SendFailed(HalError::BusOff)));
    assert!(!signal.is_pending());

    // Frame from node 2
    board.controller.queue_rx(RxElement::data(2, &[1, 2, 3, 4]));
    CanIrq::new(node.channel()).on_interrupt();

    assert_eq!(board.indicator.toggles(), 1);
    assert_eq!(
        board.console.lines(),
        vec![
            "CAN-FD Frame sent with message ID-1",
            "Error sending CAN-FD Frame with message ID-1",
            "4 bytes received with message identifier 2",
            "Rx Data : 1 2 3 4",
        ]
    );
    assert_eq!(node.dispatcher().attempts(), 2);
    assert_eq!(board.controller.state().sent[0].id, 1);
}
