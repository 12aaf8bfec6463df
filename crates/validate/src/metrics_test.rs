//! Tests for metrics validation

use super::*;
use weir_protocol::parse_metrics;

const NOW_MS: u64 = 1_705_689_600_000;

fn parsed(body: &str) -> weir_protocol::ParsedMetrics<'_> {
    parse_metrics(body.as_bytes()).unwrap()
}

fn config() -> MetricsValidationConfig {
    MetricsValidationConfig::strict()
}

// ============================================================================
// Happy path
// ============================================================================

#[test]
fn test_valid_record_passes_through() {
    let body = format!(
        r#"{{"agent_id":"web-1","seq":1,"ts":{NOW_MS},"metrics":[{{"n":"cpu","v":75.5}}]}}"#
    );
    let validated = validate_metrics(parsed(&body), &config(), NOW_MS).unwrap();

    assert_eq!(validated.agent_id, b"web-1");
    assert_eq!(validated.seq, 1);
    assert_eq!(validated.ts, NOW_MS);
    assert_eq!(validated.metrics.len(), 1);
    assert_eq!(validated.metrics[0].value, 75.5);
}

// ============================================================================
// Timestamp window
// ============================================================================

#[test]
fn test_timestamp_boundaries() {
    let cases = [
        (NOW_MS - 300_000, Ok(())),
        (NOW_MS - 300_001, Err(MetricsValidationDrop::TimestampTooOld)),
        (NOW_MS + 60_000, Ok(())),
        (NOW_MS + 60_001, Err(MetricsValidationDrop::TimestampInFuture)),
    ];

    for (ts, expected) in cases {
        let body = format!(r#"{{"agent_id":"a","seq":1,"ts":{ts},"metrics":[]}}"#);
        let result = validate_metrics(parsed(&body), &config(), NOW_MS).map(|_| ());
        assert_eq!(result, expected, "ts {ts}");
    }
}

#[test]
fn test_timestamp_required() {
    let body = r#"{"agent_id":"a","seq":1,"metrics":[]}"#;
    assert_eq!(
        validate_metrics(parsed(body), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::TimestampMissing
    );

    let lenient = MetricsValidationConfig {
        require_timestamp: false,
        ..config()
    };
    let validated = validate_metrics(parsed(body), &lenient, NOW_MS).unwrap();
    assert_eq!(validated.ts, 0);
}

// ============================================================================
// Agent id
// ============================================================================

#[test]
fn test_agent_id_format_enforced() {
    // "9a" clears the parse charset but not the leading-letter rule.
    let body = format!(r#"{{"agent_id":"9a","seq":1,"ts":{NOW_MS},"metrics":[]}}"#);
    assert_eq!(
        validate_metrics(parsed(&body), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::AgentIdInvalidFormat
    );

    // Same for the dotted form.
    let body = format!(r#"{{"agent_id":"web.1","seq":1,"ts":{NOW_MS},"metrics":[]}}"#);
    assert_eq!(
        validate_metrics(parsed(&body), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::AgentIdInvalidFormat
    );
}

// ============================================================================
// Metric values
// ============================================================================

fn value_body(value: &str) -> String {
    format!(r#"{{"agent_id":"a","seq":1,"ts":{NOW_MS},"metrics":[{{"n":"m","v":{value}}}]}}"#)
}

#[test]
fn test_value_range_boundaries_inclusive() {
    assert!(validate_metrics(parsed(&value_body("1e15")), &config(), NOW_MS).is_ok());
    assert_eq!(
        validate_metrics(parsed(&value_body("1.1e15")), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::MetricValueTooHigh
    );
    assert!(validate_metrics(parsed(&value_body("-1e15")), &config(), NOW_MS).is_ok());
    assert_eq!(
        validate_metrics(parsed(&value_body("-1.1e15")), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::MetricValueTooLow
    );
}

#[test]
fn test_infinity_via_overflowing_literal() {
    // 1e999 overflows f64 parsing to +inf; the parser accepts it as a
    // number and the validator rejects it.
    assert_eq!(
        validate_metrics(parsed(&value_body("1e999")), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::MetricValueInfinity
    );
    assert_eq!(
        validate_metrics(parsed(&value_body("-1e999")), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::MetricValueInfinity
    );
}

#[test]
fn test_infinity_allowed_when_configured() {
    let lenient = MetricsValidationConfig {
        value_rules: MetricValueRules {
            reject_infinity: false,
            ..MetricValueRules::default()
        },
        ..config()
    };
    // Non-finite values skip the range check entirely.
    let body = value_body("1e999");
    let validated = validate_metrics(parsed(&body), &lenient, NOW_MS).unwrap();
    assert!(validated.metrics[0].value.is_infinite());
}

#[test]
fn test_second_metric_checked_too() {
    let body = format!(
        r#"{{"agent_id":"a","seq":1,"ts":{NOW_MS},"metrics":[{{"n":"ok","v":1}},{{"n":"bad","v":1e999}}]}}"#
    );
    assert_eq!(
        validate_metrics(parsed(&body), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::MetricValueInfinity
    );
}

#[test]
fn test_empty_metric_name_rejected() {
    let body = format!(r#"{{"agent_id":"a","seq":1,"ts":{NOW_MS},"metrics":[{{"n":"","v":1}}]}}"#);
    assert_eq!(
        validate_metrics(parsed(&body), &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::MetricNameEmpty
    );
}

#[test]
fn test_nan_rejected() {
    // The number grammar cannot spell NaN, so construct the record
    // directly; the rule still holds for any upstream that could.
    let body = value_body("1");
    let mut record = parsed(&body);
    record.metrics[0].value = f64::NAN;
    assert_eq!(
        validate_metrics(record, &config(), NOW_MS).unwrap_err(),
        MetricsValidationDrop::MetricValueNaN
    );
}

#[test]
fn test_reason_counter_indices_are_dense() {
    for (i, reason) in MetricsValidationDrop::ALL.iter().enumerate() {
        assert_eq!(reason.index(), i);
    }
}
