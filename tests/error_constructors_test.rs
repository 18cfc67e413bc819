use upsbridge::error::BridgeError;
use upsbridge::transport::WriteError;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(BridgeError::config("x"), BridgeError::Config { .. }));
    assert!(matches!(
        BridgeError::invalid_write("ups.beeper.status", "x"),
        BridgeError::InvalidWriteValue { .. }
    ));
    assert!(matches!(
        BridgeError::transport("x"),
        BridgeError::Transport { .. }
    ));
    assert!(matches!(
        BridgeError::precondition("x"),
        BridgeError::PreconditionNotMet { .. }
    ));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(
        BridgeError::unknown_variable("x"),
        BridgeError::UnknownVariable { .. }
    ));
    assert!(matches!(
        BridgeError::not_writable("x"),
        BridgeError::NotWritable { .. }
    ));
    assert!(matches!(
        BridgeError::unknown_command("x"),
        BridgeError::UnknownCommand { .. }
    ));
    assert!(matches!(
        BridgeError::missing_data("x"),
        BridgeError::MissingData { .. }
    ));
    assert!(matches!(BridgeError::io("x"), BridgeError::Io { .. }));
    assert!(matches!(
        BridgeError::generic("x"),
        BridgeError::Generic { .. }
    ));
}

#[test]
fn write_errors_become_transport_errors() {
    let e: BridgeError = WriteError::io("link down").into();
    assert!(matches!(e, BridgeError::Transport { .. }));
}

#[test]
fn display_messages() {
    let e = BridgeError::validation("poll.interval_ms", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
    assert!(s.contains("poll.interval_ms"));

    let e = BridgeError::invalid_write("ups.beeper.status", "unknown label");
    assert!(e.to_string().contains("ups.beeper.status"));
}
