/*!
 * Tests for application configuration functionality
 */

use std::time::Duration;

use unidub::app_config::{Config, LogLevel, DEFAULT_BASE_URL};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.api.request_timeout_secs, 30);
    assert_eq!(config.api.upload_timeout_secs, 600);
    assert_eq!(config.polling.interval_ms, 3000);
    assert_eq!(config.polling.backoff_cap_ms, 30_000);
    assert_eq!(config.polling.max_consecutive_errors, 10);
    assert_eq!(config.polling.max_duration_secs, 86_400);
    assert_eq!(config.dubbing.target_language, "es");
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_polling_config_toPolicy_shouldConvertUnits() {
    let policy = Config::default().polling.to_policy();
    assert_eq!(policy.interval, Duration::from_secs(3));
    assert_eq!(policy.backoff_cap, Duration::from_secs(30));
    assert_eq!(policy.max_consecutive_errors, 10);
    assert_eq!(policy.max_duration, Duration::from_secs(24 * 60 * 60));
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.api.base_url = "ftp://files.example.com".to_string();
    assert!(config.validate().is_err());
    config.api.base_url = "not a url".to_string();
    assert!(config.validate().is_err());
    config.api.base_url = "http://localhost:8080".to_string();
    assert!(config.validate().is_ok());

    config.api.request_timeout_secs = 0;
    assert!(config.validate().is_err());
    config.api.request_timeout_secs = 30;

    config.polling.backoff_cap_ms = 1000;
    assert!(config.validate().is_err());
    config.polling.backoff_cap_ms = 30_000;

    config.polling.max_consecutive_errors = 0;
    assert!(config.validate().is_err());
    config.polling.max_consecutive_errors = 10;

    config.dubbing.target_language = "qqq".to_string();
    assert!(config.validate().is_err());
    config.dubbing.target_language = "fra".to_string();
    assert!(config.validate().is_ok());

    config.dubbing.source_language = Some("zz".to_string());
    assert!(config.validate().is_err());
}

#[test]
fn test_load_or_create_withMissingFile_shouldWriteDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config, Config::default());
    assert!(path.exists());
    assert_eq!(Config::load_or_create(&path).unwrap(), config);
}

#[test]
fn test_load_or_create_withPartialFile_shouldFillDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        br#"{ "api": { "base_url": "http://localhost:9000" }, "dubbing": { "target_language": "fr", "voice_id": "narrator" }, "log_level": "debug" }"#,
    )
    .unwrap();

    let config = Config::load_or_create(&path).unwrap();

    assert_eq!(config.api.base_url, "http://localhost:9000");
    assert_eq!(config.api.request_timeout_secs, 30);
    assert_eq!(config.polling.interval_ms, 3000);
    assert_eq!(config.dubbing.target_language, "fr");
    assert_eq!(config.dubbing.voice_id.as_deref(), Some("narrator"));
    assert_eq!(config.log_level, LogLevel::Debug);
}

#[test]
fn test_load_or_create_withMalformedFile_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "conf.json", b"{ not json").unwrap();
    assert!(Config::load_or_create(&path).is_err());
}
