//! Tests for configuration loading and validation

use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use weir_protocol::LogLevel;

use super::{Config, ConfigError};

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_empty_config_is_complete() {
    let config = Config::from_str("").unwrap();

    assert_eq!(config.server.port, 9999);
    assert_eq!(config.server.stats_interval, Duration::from_secs(1));
    assert_eq!(config.recv.max_datagram_bytes, 1472);
    assert_eq!(config.limiter.max_sources, 1024);
    assert_eq!(config.limiter.tokens_per_sec, 100);
    assert_eq!(config.limiter.burst_tokens, 200);
    assert_eq!(config.validation.metrics.max_age, Duration::from_secs(300));
    assert!(config.validation.metrics.require_timestamp);
    assert_eq!(config.validation.logs.min_level, LogLevel::Trace);
    assert_eq!(config.validation.logs.max_message_length, 1024);
    assert!(config.validation.logs.truncate_oversized_message);
    assert_eq!(config.forwarder.max_queue_depth, 4096);
    assert_eq!(config.forwarder.max_per_agent, 64);
}

#[test]
fn test_partial_config_overrides_only_named_fields() {
    let config = Config::from_str(
        r#"
        [server]
        port = 5000

        [limiter]
        tokens_per_sec = 50
        "#,
    )
    .unwrap();

    assert_eq!(config.server.port, 5000);
    assert_eq!(config.limiter.tokens_per_sec, 50);
    // Untouched fields keep their defaults.
    assert_eq!(config.limiter.burst_tokens, 200);
    assert_eq!(config.server.address, "0.0.0.0");
}

#[test]
fn test_full_config_round_trip() {
    let config = Config::from_str(
        r#"
        [server]
        address = "127.0.0.1"
        port = 7000
        stats_interval = "5s"
        slow_sink_delay = "250ms"

        [recv]
        max_datagram_bytes = 1200
        recv_buffer_bytes = 131072

        [limiter]
        max_sources = 64
        tokens_per_sec = 10
        burst_tokens = 20

        [validation.metrics]
        max_age = "10m"
        max_future = "30s"
        require_timestamp = false
        min_value = -100.0
        max_value = 100.0

        [validation.logs]
        min_level = "warn"
        max_message_length = 256
        truncate_oversized_message = false
        require_agent_id = true

        [forwarder]
        max_queue_depth = 128
        max_per_agent = 8
        "#,
    )
    .unwrap();

    assert_eq!(config.server.bind_address(), "127.0.0.1:7000");
    assert_eq!(config.server.slow_sink_delay, Duration::from_millis(250));
    assert_eq!(config.recv.max_datagram_bytes, 1200);
    assert_eq!(config.validation.metrics.max_age, Duration::from_secs(600));
    assert!(!config.validation.metrics.require_timestamp);
    assert_eq!(config.validation.logs.min_level, LogLevel::Warn);
    assert!(config.validation.logs.require_agent_id);
    assert_eq!(config.forwarder.max_per_agent, 8);
}

// ============================================================================
// Rejections
// ============================================================================

#[test]
fn test_unknown_fields_rejected() {
    assert!(matches!(
        Config::from_str("[server]\nbogus = 1"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        Config::from_str("[bogus_section]\nx = 1"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_invalid_level_rejected() {
    assert!(matches!(
        Config::from_str("[validation.logs]\nmin_level = \"noisy\""),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_range_validation() {
    let cases = [
        "[limiter]\nmax_sources = 0",
        "[limiter]\nburst_tokens = 0",
        "[recv]\nmax_datagram_bytes = 2",
        "[recv]\nrecv_buffer_bytes = 0",
        "[forwarder]\nmax_queue_depth = 0",
        "[forwarder]\nmax_per_agent = 0",
        "[validation.logs]\nmax_message_length = 0",
        "[server]\nstats_interval = \"0s\"",
    ];
    for toml in cases {
        assert!(
            matches!(Config::from_str(toml), Err(ConfigError::InvalidValue { .. })),
            "config {toml:?}"
        );
    }
}

#[test]
fn test_min_value_above_max_rejected() {
    let toml = "[validation.metrics]\nmin_value = 10.0\nmax_value = 1.0";
    assert!(matches!(
        Config::from_str(toml),
        Err(ConfigError::InvalidValue { .. })
    ));
}

// ============================================================================
// File loading
// ============================================================================

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 4242").unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.port, 4242);
}

#[test]
fn test_load_missing_file() {
    let result = Config::load("/nonexistent/weir.toml");
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}
