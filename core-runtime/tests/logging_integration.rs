//! Integration tests for logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};

#[test]
fn test_init_logging_only_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());
}

#[test]
fn test_invalid_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_auth=notalevel");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_token_fields_are_redacted() {
    for field in ["access_token", "refresh_token", "google_current_token", "auth_code"] {
        assert_eq!(redact_if_sensitive(field, "value"), "[REDACTED]", "{field}");
    }
}

#[test]
fn test_emails_are_masked() {
    let redacted = redact_if_sensitive("address", "ada@example.org");
    assert!(redacted.starts_with('a'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.org"));
}
