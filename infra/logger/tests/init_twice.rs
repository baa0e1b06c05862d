use confkit::{ConfigError, Value};
use confkit_logger::{Logger, LoggerError};

#[test]
fn settings_are_validated_before_the_global_subscriber() {
    let _logger = Logger::builder()
        .configure(Value::from_iter([("name", "first"), ("level", "info")]))
        .init()
        .unwrap();

    let err = Logger::builder().configure(Value::from_iter([("max_files", 0)])).init().unwrap_err();
    assert!(matches!(err, LoggerError::Settings { source: ConfigError::Range { .. }, .. }));

    let err = Logger::builder().name("second").init().unwrap_err();
    assert!(matches!(err, LoggerError::Subscriber { .. }));
}
