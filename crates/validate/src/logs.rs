//! Log validation

use arrayvec::ArrayVec;
use thiserror::Error;

use weir_protocol::logfmt::{LogField, LogLevel, ParsedLog, MAX_FIELDS};

use crate::rules::{agent_id_format_ok, timestamp_in_window, TimestampWindow, AGENT_ID_MAX_LEN};

/// Log validation configuration, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct LogValidationConfig {
    pub timestamp_window: TimestampWindow,
    /// Records below this level are dropped.
    pub min_level: LogLevel,
    /// Message length cap in bytes.
    pub max_message_length: usize,
    /// Truncate an oversized message to the cap instead of rejecting it.
    pub truncate_oversized_message: bool,
    /// When set, a record without an `agent` field is rejected.
    pub require_agent_id: bool,
}

impl Default for LogValidationConfig {
    fn default() -> Self {
        Self {
            timestamp_window: TimestampWindow::default(),
            min_level: LogLevel::Trace,
            max_message_length: 1024,
            truncate_oversized_message: true,
            require_agent_id: false,
        }
    }
}

/// Log validation drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LogValidationDrop {
    #[error("timestamp older than window")]
    TimestampTooOld,
    #[error("timestamp beyond future window")]
    TimestampInFuture,
    #[error("agent id required but absent")]
    AgentIdEmpty,
    #[error("agent id too long")]
    AgentIdTooLong,
    #[error("agent id format invalid")]
    AgentIdInvalidFormat,
    #[error("level below configured floor")]
    LevelBelowMinimum,
    #[error("message exceeds length cap")]
    MessageTooLong,
    #[error("message empty")]
    MessageEmpty,
}

impl LogValidationDrop {
    /// Number of variants, for per-reason counters.
    pub const COUNT: usize = 8;

    /// All variants in counter order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::TimestampTooOld,
        Self::TimestampInFuture,
        Self::AgentIdEmpty,
        Self::AgentIdTooLong,
        Self::AgentIdInvalidFormat,
        Self::LevelBelowMinimum,
        Self::MessageTooLong,
        Self::MessageEmpty,
    ];

    /// Stable counter index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short identifier for logs and counters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimestampTooOld => "timestamp_too_old",
            Self::TimestampInFuture => "timestamp_in_future",
            Self::AgentIdEmpty => "agent_id_empty",
            Self::AgentIdTooLong => "agent_id_too_long",
            Self::AgentIdInvalidFormat => "agent_id_invalid_format",
            Self::LevelBelowMinimum => "level_below_minimum",
            Self::MessageTooLong => "message_too_long",
            Self::MessageEmpty => "message_empty",
        }
    }
}

/// Semantically valid log record. Views still borrow from the source body;
/// `msg` may be a truncated prefix of the parsed message.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLog<'a> {
    /// Empty unless the record carried an `agent` field.
    pub agent_id: &'a [u8],
    pub ts: u64,
    pub level: LogLevel,
    pub msg: &'a [u8],
    pub fields: ArrayVec<LogField<'a>, MAX_FIELDS>,
}

/// Validate a parsed log record against semantic rules.
///
/// `now_ms` is the server's wall-clock time in milliseconds. O(field
/// count), no allocation; the parsed record is consumed.
pub fn validate_log<'a>(
    parsed: ParsedLog<'a>,
    config: &LogValidationConfig,
    now_ms: u64,
) -> Result<ValidatedLog<'a>, LogValidationDrop> {
    // agent is optional for logs unless configured otherwise; when present
    // it must satisfy the same rules as a metrics agent_id.
    if parsed.agent_id.is_empty() {
        if config.require_agent_id {
            return Err(LogValidationDrop::AgentIdEmpty);
        }
    } else {
        if parsed.agent_id.len() > AGENT_ID_MAX_LEN {
            return Err(LogValidationDrop::AgentIdTooLong);
        }
        if !agent_id_format_ok(parsed.agent_id) {
            return Err(LogValidationDrop::AgentIdInvalidFormat);
        }
    }

    // ts is required at parse, so the window always applies.
    if !timestamp_in_window(parsed.ts, now_ms, config.timestamp_window) {
        let min_allowed = now_ms.saturating_sub(config.timestamp_window.max_age_ms);
        return if parsed.ts < min_allowed {
            Err(LogValidationDrop::TimestampTooOld)
        } else {
            Err(LogValidationDrop::TimestampInFuture)
        };
    }

    if parsed.level < config.min_level {
        return Err(LogValidationDrop::LevelBelowMinimum);
    }

    if parsed.msg.is_empty() {
        return Err(LogValidationDrop::MessageEmpty);
    }

    let msg = if parsed.msg.len() > config.max_message_length {
        if !config.truncate_oversized_message {
            return Err(LogValidationDrop::MessageTooLong);
        }
        // Truncation is a prefix view, not a copy.
        &parsed.msg[..config.max_message_length]
    } else {
        parsed.msg
    };

    Ok(ValidatedLog {
        agent_id: parsed.agent_id,
        ts: parsed.ts,
        level: parsed.level,
        msg,
        fields: parsed.fields,
    })
}

#[cfg(test)]
#[path = "logs_test.rs"]
mod logs_test;
