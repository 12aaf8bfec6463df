//! Tests for canonical event serialization

use serde_json::Value;

use super::{canonical_log, canonical_metrics, EventKind};
use weir_protocol::{parse_log, parse_metrics};
use weir_validate::{
    validate_log, validate_metrics, LogValidationConfig, MetricsValidationConfig,
};

const NOW_MS: u64 = 1_705_689_600_000;

fn metrics_event(body: &str) -> super::QueuedEvent {
    let parsed = parse_metrics(body.as_bytes()).unwrap();
    let validated =
        validate_metrics(parsed, &MetricsValidationConfig::strict(), NOW_MS).unwrap();
    canonical_metrics(&validated)
}

fn log_event(line: &str) -> super::QueuedEvent {
    let parsed = parse_log(line.as_bytes()).unwrap();
    let validated = validate_log(parsed, &LogValidationConfig::default(), NOW_MS).unwrap();
    canonical_log(&validated)
}

#[test]
fn test_metrics_canonical_document() {
    let body = format!(
        r#"{{"agent_id":"web-1","seq":42,"ts":{NOW_MS},"metrics":[{{"n":"cpu","v":75.5,"u":"percent","t":{{"env":"prod"}}}},{{"n":"rps","v":1200}}]}}"#
    );
    let event = metrics_event(&body);

    assert_eq!(event.agent_id, "web-1");
    assert_eq!(event.kind, EventKind::Metrics);

    let doc: Value = serde_json::from_slice(&event.payload).unwrap();
    assert_eq!(doc["kind"], "metrics");
    assert_eq!(doc["agent_id"], "web-1");
    assert_eq!(doc["seq"], 42);
    assert_eq!(doc["ts"], NOW_MS);
    assert_eq!(doc["metrics"][0]["n"], "cpu");
    assert_eq!(doc["metrics"][0]["v"], 75.5);
    assert_eq!(doc["metrics"][0]["u"], "percent");
    assert_eq!(doc["metrics"][0]["t"][0][0], "env");
    assert_eq!(doc["metrics"][0]["t"][0][1], "prod");

    // Absent optionals are omitted, not defaulted.
    assert!(doc["metrics"][1].get("u").is_none());
    assert!(doc["metrics"][1].get("t").is_none());
}

#[test]
fn test_log_canonical_document() {
    let line = format!(
        r#"ts={NOW_MS} level=error agent=web-1 msg="Connection refused" request_id=req-9"#
    );
    let event = log_event(&line);

    assert_eq!(event.agent_id, "web-1");
    assert_eq!(event.kind, EventKind::Log);

    let doc: Value = serde_json::from_slice(&event.payload).unwrap();
    assert_eq!(doc["kind"], "log");
    assert_eq!(doc["agent_id"], "web-1");
    assert_eq!(doc["ts"], NOW_MS);
    assert_eq!(doc["level"], "error");
    assert_eq!(doc["msg"], "Connection refused");

    // Pass-through fields keep line order.
    let fields = doc["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields[0][0], "ts");
    assert_eq!(fields[4][0], "request_id");
    assert_eq!(fields[4][1], "req-9");
}

#[test]
fn test_hostile_strings_stay_inside_framing() {
    // Quotes, backslashes and control bytes must not escape the canonical
    // JSON framing.
    let body = r#"{"agent_id":"a","seq":1,"metrics":[{"n":"x\"y","v":1,"t":{"k":"v1\\v2"}}]}"#;
    let parsed = parse_metrics(body.as_bytes()).unwrap();
    let lenient = MetricsValidationConfig::default();
    let validated = validate_metrics(parsed, &lenient, NOW_MS).unwrap();
    let event = canonical_metrics(&validated);

    // The payload must round-trip as a single JSON document.
    let doc: Value = serde_json::from_slice(&event.payload).unwrap();
    // The raw view kept the escape bytes; canonicalization re-escapes them.
    assert_eq!(doc["metrics"][0]["n"], r#"x\"y"#);
    assert_eq!(doc["metrics"][0]["t"][0][1], r#"v1\\v2"#);
}

#[test]
fn test_invalid_utf8_replaced_at_copy_boundary() {
    let line = b"ts=1705689600000 level=info msg=\"a\xFFb\"";
    let parsed = parse_log(line).unwrap();
    let validated = validate_log(parsed, &LogValidationConfig::default(), NOW_MS).unwrap();
    let event = canonical_log(&validated);

    let doc: Value = serde_json::from_slice(&event.payload).unwrap();
    assert_eq!(doc["msg"], "a\u{FFFD}b");
}

#[test]
fn test_truncated_message_serialized_truncated() {
    let long_msg = "x".repeat(200);
    let line = format!(r#"ts={NOW_MS} level=info msg="{long_msg}""#);
    let parsed = parse_log(line.as_bytes()).unwrap();
    let config = LogValidationConfig {
        max_message_length: 100,
        ..LogValidationConfig::default()
    };
    let validated = validate_log(parsed, &config, NOW_MS).unwrap();
    let event = canonical_log(&validated);

    let doc: Value = serde_json::from_slice(&event.payload).unwrap();
    assert_eq!(doc["msg"].as_str().unwrap().len(), 100);
}
