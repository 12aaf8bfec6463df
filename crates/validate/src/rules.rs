//! Shared validation rules
//!
//! Rules used by both the metrics and log validators: the agent-id format
//! and the timestamp acceptance window.

/// Maximum agent id length in bytes.
pub const AGENT_ID_MAX_LEN: usize = 64;

/// Timestamp acceptance window relative to server time, in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct TimestampWindow {
    /// How far in the past a timestamp may sit.
    pub max_age_ms: u64,
    /// How far in the future a timestamp may sit.
    pub max_future_ms: u64,
}

impl Default for TimestampWindow {
    fn default() -> Self {
        Self {
            max_age_ms: 300_000,
            max_future_ms: 60_000,
        }
    }
}

/// Check the agent id format: `^[A-Za-z][A-Za-z0-9_-]{0,63}$`.
///
/// Stricter than the parse-stage charset: the leading byte must be a
/// letter and `.` is not allowed here.
pub fn agent_id_format_ok(agent_id: &[u8]) -> bool {
    let Some((&first, rest)) = agent_id.split_first() else {
        return false;
    };
    if agent_id.len() > AGENT_ID_MAX_LEN {
        return false;
    }
    first.is_ascii_alphabetic()
        && rest
            .iter()
            .all(|&c| c.is_ascii_alphanumeric() || c == b'_' || c == b'-')
}

/// Check `now_ms - max_age_ms <= ts <= now_ms + max_future_ms`, both bounds
/// inclusive. The lower bound saturates at zero rather than wrapping.
pub fn timestamp_in_window(ts: u64, now_ms: u64, window: TimestampWindow) -> bool {
    let min_allowed = now_ms.saturating_sub(window.max_age_ms);
    let max_allowed = now_ms.saturating_add(window.max_future_ms);
    ts >= min_allowed && ts <= max_allowed
}

#[cfg(test)]
#[path = "rules_test.rs"]
mod rules_test;
