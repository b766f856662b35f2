//! Unit tests for configuration parsing, validation, defaults, and the
//! `GFXTAP_SERVER` environment override.

use std::time::Duration;

use gfxtap::config::{GlobalConfig, SERVER_ENV};
use gfxtap::AppError;

fn sample_toml() -> &'static str {
    r#"
[server]
address = "capture-host:41000"
connect_timeout_seconds = 5

[capture]
status_interval_seconds = 1
dispose_grace_millis = 250
"#
}

// ── Parsing and defaults ────────────────────────────────────────────────────

#[test]
fn parses_valid_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.server.address, "capture-host:41000");
    assert_eq!(config.server.connect_timeout_seconds, 5);
    assert_eq!(config.capture.status_interval_seconds, 1);
    assert_eq!(config.capture.dispose_grace_millis, 250);
}

/// Configuration is optional: an empty document yields the built-in
/// defaults for both sections.
#[test]
fn empty_document_yields_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("empty config parses");

    assert_eq!(config, GlobalConfig::default());
    assert_eq!(config.server.address, "127.0.0.1:40000");
    assert_eq!(config.server.connect_timeout_seconds, 15);
    assert_eq!(config.capture.status_interval_seconds, 3);
    assert_eq!(config.capture.dispose_grace_millis, 500);
}

/// A section may set only some of its fields; the rest keep their defaults.
#[test]
fn partial_section_keeps_field_defaults() {
    let toml = r#"
[server]
address = "10.0.0.5:40000"
"#;

    let config = GlobalConfig::from_toml_str(toml).expect("config parses");
    assert_eq!(config.server.address, "10.0.0.5:40000");
    assert_eq!(
        config.server.connect_timeout_seconds, 15,
        "unset fields must keep their defaults"
    );
    assert_eq!(config.capture, GlobalConfig::default().capture);
}

#[test]
fn duration_accessors_convert_units() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.connect_timeout(), Duration::from_secs(5));
    assert_eq!(config.status_interval(), Duration::from_secs(1));
    assert_eq!(config.dispose_grace(), Duration::from_millis(250));
}

// ── Validation ──────────────────────────────────────────────────────────────

#[test]
fn rejects_invalid_field_type() {
    let toml = r#"
[server]
address = 41000
"#;

    let result = GlobalConfig::from_toml_str(toml);
    assert!(
        matches!(result, Err(AppError::Config(_))),
        "a non-string address must be rejected, got: {result:?}"
    );
}

#[test]
fn rejects_empty_address() {
    let toml = r#"
[server]
address = ""
"#;

    let result = GlobalConfig::from_toml_str(toml);
    match result {
        Err(AppError::Config(msg)) => assert!(
            msg.contains("server.address"),
            "error must name the offending field, got: {msg}"
        ),
        other => panic!("expected Err(AppError::Config), got: {other:?}"),
    }
}

#[test]
fn rejects_zero_connect_timeout() {
    let toml = r#"
[server]
connect_timeout_seconds = 0
"#;

    let result = GlobalConfig::from_toml_str(toml);
    match result {
        Err(AppError::Config(msg)) => assert!(
            msg.contains("connect_timeout_seconds"),
            "error must name the offending field, got: {msg}"
        ),
        other => panic!("expected Err(AppError::Config), got: {other:?}"),
    }
}

#[test]
fn rejects_zero_status_interval() {
    let toml = r#"
[capture]
status_interval_seconds = 0
"#;

    let result = GlobalConfig::from_toml_str(toml);
    assert!(
        matches!(result, Err(AppError::Config(_))),
        "a zero poll interval must be rejected, got: {result:?}"
    );
}

// ── File loading ────────────────────────────────────────────────────────────

#[test]
fn loads_config_from_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("gfxtap.toml");
    std::fs::write(&path, sample_toml()).expect("write config file");

    let config = GlobalConfig::load_from_path(&path).expect("config loads");
    assert_eq!(config.server.address, "capture-host:41000");
}

#[test]
fn missing_file_is_a_config_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("does-not-exist.toml");

    let result = GlobalConfig::load_from_path(&path);
    match result {
        Err(AppError::Config(msg)) => assert!(
            msg.contains("failed to read config"),
            "error must mention the read failure, got: {msg}"
        ),
        other => panic!("expected Err(AppError::Config), got: {other:?}"),
    }
}

// ── Environment override ────────────────────────────────────────────────────

/// `GFXTAP_SERVER` replaces the configured address when set.
#[test]
#[serial_test::serial]
#[allow(unsafe_code)]
fn env_var_overrides_address() {
    unsafe {
        std::env::set_var(SERVER_ENV, "env-host:42000");
    }

    let mut config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");
    config.apply_env_override();

    unsafe {
        std::env::remove_var(SERVER_ENV);
    }

    assert_eq!(
        config.server.address, "env-host:42000",
        "the environment variable must win over the file"
    );
}

/// An empty `GFXTAP_SERVER` value is ignored; the configured address stays.
#[test]
#[serial_test::serial]
#[allow(unsafe_code)]
fn empty_env_var_is_ignored() {
    unsafe {
        std::env::set_var(SERVER_ENV, "");
    }

    let mut config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");
    config.apply_env_override();

    unsafe {
        std::env::remove_var(SERVER_ENV);
    }

    assert_eq!(
        config.server.address, "capture-host:41000",
        "an empty override must not clobber the configured address"
    );
}

/// Without `GFXTAP_SERVER` the configured address is untouched.
#[test]
#[serial_test::serial]
#[allow(unsafe_code)]
fn absent_env_var_keeps_configured_address() {
    unsafe {
        std::env::remove_var(SERVER_ENV);
    }

    let mut config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");
    config.apply_env_override();

    assert_eq!(config.server.address, "capture-host:41000");
}
