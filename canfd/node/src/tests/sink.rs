use hal::can::RxCallback;

use super::mocks::{MockPin, RecordingConsole, RxElement};
use crate::rx::RxSink;

fn sink() -> (RxSink<MockPin, RecordingConsole>, MockPin, RecordingConsole) {
    let pin = MockPin::default();
    let console = RecordingConsole::default();
    (RxSink::new(pin.clone(), console.clone()), pin, console)
}

fn deliver(sink: &mut RxSink<MockPin, RecordingConsole>, element: &RxElement) {
    sink.on_receive(element.valid, 0, &element.record());
}

#[test]
fn data_frame_toggles_and_logs() {
    let (mut sink, pin, console) = sink();
    deliver(&mut sink, &RxElement::data(2, &[1, 2, 3, 4]));

    assert_eq!(pin.toggles(), 1);
    assert_eq!(sink.received(), 1);
    assert_eq!(
        console.lines(),
        vec![
            "4 bytes received with message identifier 2".to_string(),
            "Rx Data : 1 2 3 4".to_string(),
        ]
    );
}

#[test]
fn invalid_reception_is_silent() {
    let (mut sink, pin, console) = sink();
    for len in 0..=8u8 {
        let payload: Vec<u8> = (0..len).collect();
        deliver(&mut sink, &RxElement::invalid(1, &payload));
    }
    assert_eq!(pin.toggles(), 0);
    assert!(console.lines().is_empty());
}

#[test]
fn remote_frame_does_not_toggle() {
    let (mut sink, pin, console) = sink();
    deliver(&mut sink, &RxElement::remote(2, 8));
    assert_eq!(pin.toggles(), 0);
    assert!(console.lines().is_empty());
}

#[test]
fn logged_bytes_match_source_for_every_length() {
    for len in 0..=8usize {
        let (mut sink, pin, console) = sink();
        let payload: Vec<u8> = (0..len).map(|i| 250u8.wrapping_add(i as u8)).collect();
        deliver(&mut sink, &RxElement::data(9, &payload));

        let lines = console.lines();
        assert_eq!(lines[0], format!("{len} bytes received with message identifier 9"));
        let logged: Vec<u8> = lines[1]
            .trim_start_matches("Rx Data :")
            .split_whitespace()
            .map(|b| b.parse().unwrap())
            .collect();
        assert_eq!(logged, payload);
        assert_eq!(pin.toggles(), 1);
    }
}

#[test]
fn empty_payload_logs_bare_prefix() {
    let (mut sink, _pin, console) = sink();
    deliver(&mut sink, &RxElement::data(5, &[]));
    assert_eq!(console.lines()[1], "Rx Data :");
}

#[test]
fn indicator_follows_each_frame() {
    let (mut sink, pin, _console) = sink();
    deliver(&mut sink, &RxElement::data(2, &[0]));
    assert_eq!(pin.level(), hal::gpio::Level::High);
    deliver(&mut sink, &RxElement::data(2, &[0]));
    assert_eq!(pin.level(), hal::gpio::Level::Low);
}

#[test]
fn failed_toggle_still_logs() {
    let console = RecordingConsole::default();
    let mut sink = RxSink::new(MockPin::failing_toggle(), console.clone());
    deliver(&mut sink, &RxElement::data(2, &[7]));
    assert_eq!(console.lines().len(), 2);
}
