use super::logging;
use super::MqError;
use crate::client::State;

#[test]
fn logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn parse_level_falls_back_to_info() {
    assert_eq!(logging::parse_level("ERROR"), tracing::Level::ERROR);
    assert_eq!(logging::parse_level("warning"), tracing::Level::WARN);
    assert_eq!(logging::parse_level("trace"), tracing::Level::TRACE);
    assert_eq!(logging::parse_level("verbose"), tracing::Level::INFO);
}

#[test]
fn invalid_state_message_names_operation() {
    let err = MqError::InvalidState {
        operation: "start",
        state: State::Stopped,
    };
    assert_eq!(err.to_string(), "cannot start an engine in state Stopped");
}
