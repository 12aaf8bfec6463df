//! Metrics validation

use arrayvec::ArrayVec;
use thiserror::Error;

use weir_protocol::metrics::{Metric, ParsedMetrics, MAX_METRICS};

use crate::rules::{agent_id_format_ok, timestamp_in_window, TimestampWindow, AGENT_ID_MAX_LEN};

/// Value acceptance rules applied per metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricValueRules {
    pub min_value: f64,
    pub max_value: f64,
    pub reject_nan: bool,
    pub reject_infinity: bool,
}

impl Default for MetricValueRules {
    fn default() -> Self {
        Self {
            min_value: -1e15,
            max_value: 1e15,
            reject_nan: true,
            reject_infinity: true,
        }
    }
}

/// Metrics validation configuration, fixed at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsValidationConfig {
    pub timestamp_window: TimestampWindow,
    pub value_rules: MetricValueRules,
    /// When set, a record whose `ts` was absent (parsed as 0) is rejected.
    pub require_timestamp: bool,
}

impl MetricsValidationConfig {
    /// Defaults with timestamps required, matching gateway defaults.
    pub fn strict() -> Self {
        Self {
            require_timestamp: true,
            ..Self::default()
        }
    }
}

/// Metrics validation drops. Semantic failures only; shape failures were
/// already handled at parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricsValidationDrop {
    #[error("timestamp required but absent")]
    TimestampMissing,
    #[error("timestamp older than window")]
    TimestampTooOld,
    #[error("timestamp beyond future window")]
    TimestampInFuture,
    #[error("agent_id empty")]
    AgentIdEmpty,
    #[error("agent_id too long")]
    AgentIdTooLong,
    #[error("agent_id format invalid")]
    AgentIdInvalidFormat,
    #[error("metric value is NaN")]
    MetricValueNaN,
    #[error("metric value is infinite")]
    MetricValueInfinity,
    #[error("metric value below minimum")]
    MetricValueTooLow,
    #[error("metric value above maximum")]
    MetricValueTooHigh,
    #[error("metric name empty")]
    MetricNameEmpty,
}

impl MetricsValidationDrop {
    /// Number of variants, for per-reason counters.
    pub const COUNT: usize = 11;

    /// All variants in counter order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::TimestampMissing,
        Self::TimestampTooOld,
        Self::TimestampInFuture,
        Self::AgentIdEmpty,
        Self::AgentIdTooLong,
        Self::AgentIdInvalidFormat,
        Self::MetricValueNaN,
        Self::MetricValueInfinity,
        Self::MetricValueTooLow,
        Self::MetricValueTooHigh,
        Self::MetricNameEmpty,
    ];

    /// Stable counter index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short identifier for logs and counters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimestampMissing => "timestamp_missing",
            Self::TimestampTooOld => "timestamp_too_old",
            Self::TimestampInFuture => "timestamp_in_future",
            Self::AgentIdEmpty => "agent_id_empty",
            Self::AgentIdTooLong => "agent_id_too_long",
            Self::AgentIdInvalidFormat => "agent_id_invalid_format",
            Self::MetricValueNaN => "metric_value_nan",
            Self::MetricValueInfinity => "metric_value_infinity",
            Self::MetricValueTooLow => "metric_value_too_low",
            Self::MetricValueTooHigh => "metric_value_too_high",
            Self::MetricNameEmpty => "metric_name_empty",
        }
    }
}

/// Semantically valid metrics record, same shape as its parsed counterpart.
/// Views still borrow from the source body.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedMetrics<'a> {
    pub agent_id: &'a [u8],
    pub seq: u32,
    pub ts: u64,
    pub metrics: ArrayVec<Metric<'a>, MAX_METRICS>,
}

/// Validate a parsed metrics record against semantic rules.
///
/// `now_ms` is the server's wall-clock time in milliseconds. O(metric
/// count), no allocation; the parsed record is consumed.
pub fn validate_metrics<'a>(
    parsed: ParsedMetrics<'a>,
    config: &MetricsValidationConfig,
    now_ms: u64,
) -> Result<ValidatedMetrics<'a>, MetricsValidationDrop> {
    // agent_id: parse already bounded length and charset, the format rule
    // here is stricter.
    if parsed.agent_id.is_empty() {
        return Err(MetricsValidationDrop::AgentIdEmpty);
    }
    if parsed.agent_id.len() > AGENT_ID_MAX_LEN {
        return Err(MetricsValidationDrop::AgentIdTooLong);
    }
    if !agent_id_format_ok(parsed.agent_id) {
        return Err(MetricsValidationDrop::AgentIdInvalidFormat);
    }

    // Timestamp: ts == 0 means "absent" at parse, so the window only
    // applies to provided timestamps.
    if parsed.ts == 0 {
        if config.require_timestamp {
            return Err(MetricsValidationDrop::TimestampMissing);
        }
    } else if !timestamp_in_window(parsed.ts, now_ms, config.timestamp_window) {
        let min_allowed = now_ms.saturating_sub(config.timestamp_window.max_age_ms);
        return if parsed.ts < min_allowed {
            Err(MetricsValidationDrop::TimestampTooOld)
        } else {
            Err(MetricsValidationDrop::TimestampInFuture)
        };
    }

    // Values, O(metric count).
    let rules = &config.value_rules;
    for metric in &parsed.metrics {
        if metric.name.is_empty() {
            return Err(MetricsValidationDrop::MetricNameEmpty);
        }

        if metric.value.is_nan() {
            if rules.reject_nan {
                return Err(MetricsValidationDrop::MetricValueNaN);
            }
        } else if metric.value.is_infinite() {
            if rules.reject_infinity {
                return Err(MetricsValidationDrop::MetricValueInfinity);
            }
        } else {
            // Range applies to finite values only; both bounds inclusive.
            if metric.value < rules.min_value {
                return Err(MetricsValidationDrop::MetricValueTooLow);
            }
            if metric.value > rules.max_value {
                return Err(MetricsValidationDrop::MetricValueTooHigh);
            }
        }
    }

    Ok(ValidatedMetrics {
        agent_id: parsed.agent_id,
        seq: parsed.seq,
        ts: parsed.ts,
        metrics: parsed.metrics,
    })
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;
