//! Semantic validation
//!
//! The content parsers establish shape; this crate establishes meaning.
//! A parsed record that clears validation carries the downstream contract:
//! the agent id matches its pattern, the timestamp sits inside the
//! configured window, metric values are finite and in range, the log level
//! clears the floor, and the message fits its cap.
//!
//! Validation neither allocates nor copies: validated records take
//! ownership of their parsed counterparts, and the only transformation
//! applied is message truncation, which reslices a prefix view. All rules
//! are O(record size), bounded by the parser's fixed capacities.

mod logs;
mod metrics;
mod rules;

pub use logs::{validate_log, LogValidationConfig, LogValidationDrop, ValidatedLog};
pub use metrics::{
    validate_metrics, MetricValueRules, MetricsValidationConfig, MetricsValidationDrop,
    ValidatedMetrics,
};
pub use rules::{agent_id_format_ok, timestamp_in_window, TimestampWindow, AGENT_ID_MAX_LEN};
