use upsbridge::config::LoggingConfig;
use upsbridge::logging::{LogContext, StructuredLogger, get_device_logger, init_logging};

#[test]
fn file_logging_initializes_once() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let config = LoggingConfig {
        level: "debug".to_string(),
        file: tmp_dir.path().join("upsbridge.log").to_string_lossy().to_string(),
        console_output: false,
        ..LoggingConfig::default()
    };
    assert!(init_logging(&config).is_ok());
    assert!(init_logging(&config).is_ok());

    let logger = get_device_logger("driver", "5P 650");
    assert_eq!(logger.context().component, "driver");
    assert_eq!(logger.context().device.as_deref(), Some("5P 650"));
    logger.info("driver ready");
    logger.debug("poll complete");
    drop(tmp_dir);
}

#[test]
fn log_context_collects_fields() {
    let logger = StructuredLogger::new(
        LogContext::new("transport").with_field("path", "UPS.PowerSummary.Voltage".to_string()),
    );
    assert_eq!(
        logger.context().extra_fields.get("path").map(String::as_str),
        Some("UPS.PowerSummary.Voltage")
    );
    logger.warn("write refused");
}
