//! Validation sections

use std::time::Duration;

use serde::Deserialize;

use weir_protocol::LogLevel;

use crate::error::{ConfigError, Result};

/// Container for both validator configurations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSection {
    pub metrics: MetricsValidationSection,
    pub logs: LogValidationSection,
}

impl ValidationSection {
    pub(crate) fn validate(&self) -> Result<()> {
        self.metrics.validate()?;
        self.logs.validate()?;
        Ok(())
    }
}

/// Metrics validation settings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsValidationSection {
    /// How far in the past a timestamp may sit.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,

    /// How far in the future a timestamp may sit.
    #[serde(with = "humantime_serde")]
    pub max_future: Duration,

    /// Reject records whose `ts` field was absent.
    pub require_timestamp: bool,

    /// Reject NaN metric values.
    pub reject_nan: bool,

    /// Reject infinite metric values.
    pub reject_infinity: bool,

    /// Lowest accepted metric value.
    pub min_value: f64,

    /// Highest accepted metric value.
    pub max_value: f64,
}

impl Default for MetricsValidationSection {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(300),
            max_future: Duration::from_secs(60),
            require_timestamp: true,
            reject_nan: true,
            reject_infinity: true,
            min_value: -1e15,
            max_value: 1e15,
        }
    }
}

impl MetricsValidationSection {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.min_value > self.max_value {
            return Err(ConfigError::invalid(
                "validation.metrics",
                "min_value",
                "must not exceed max_value",
            ));
        }
        if self.min_value.is_nan() || self.max_value.is_nan() {
            return Err(ConfigError::invalid(
                "validation.metrics",
                "min_value",
                "bounds must not be NaN",
            ));
        }
        Ok(())
    }
}

/// Log validation settings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogValidationSection {
    /// How far in the past a timestamp may sit.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,

    /// How far in the future a timestamp may sit.
    #[serde(with = "humantime_serde")]
    pub max_future: Duration,

    /// Records below this level are dropped.
    pub min_level: LogLevel,

    /// Message length cap in bytes.
    pub max_message_length: usize,

    /// Truncate an oversized message instead of rejecting the record.
    pub truncate_oversized_message: bool,

    /// Require the `agent` field.
    pub require_agent_id: bool,
}

impl Default for LogValidationSection {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(300),
            max_future: Duration::from_secs(60),
            min_level: LogLevel::Trace,
            max_message_length: 1024,
            truncate_oversized_message: true,
            require_agent_id: false,
        }
    }
}

impl LogValidationSection {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_message_length == 0 {
            return Err(ConfigError::invalid(
                "validation.logs",
                "max_message_length",
                "must be positive",
            ));
        }
        Ok(())
    }
}
