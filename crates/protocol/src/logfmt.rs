//! Log content parser (logfmt)
//!
//! Parses one logfmt line into a fixed-capacity record:
//!
//! ```text
//! ts=1705689600000 level=error agent=web-1 msg="Connection refused" request_id=req-9
//! ```
//!
//! Grammar, single pass, no backtracking:
//!
//! ```text
//! line   = field (WS+ field)*        WS = space | tab
//! field  = key "=" value
//! key    = [a-z_][a-z0-9_]*
//! value  = bare | quoted
//! bare   = [^ \t"=]+
//! quoted = '"' [^"]* '"'             no escapes inside quotes
//! ```
//!
//! Trailing whitespace and newlines are trimmed before parsing. `ts`,
//! `level` and `msg` are required; `agent` is optional. Every parsed field,
//! required ones included, is also preserved in order for pass-through.

use serde::Deserialize;
use thiserror::Error;

use arrayvec::ArrayVec;

/// Pre-parse size gate for one line.
pub const MAX_LINE_BYTES: usize = 2048;
/// Cardinality cap for fields on one line.
pub const MAX_FIELDS: usize = 16;
/// Length cap for a field key.
pub const MAX_KEY_LEN: usize = 32;
/// Length cap for a field value.
pub const MAX_VALUE_LEN: usize = 1024;

/// Log severity, ordered. Comparison against the configured floor uses the
/// ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl LogLevel {
    /// Parse a level token. Exact lowercase match only.
    pub fn from_bytes(s: &[u8]) -> Option<Self> {
        match s {
            b"trace" => Some(Self::Trace),
            b"debug" => Some(Self::Debug),
            b"info" => Some(Self::Info),
            b"warn" => Some(Self::Warn),
            b"error" => Some(Self::Error),
            b"fatal" => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log parse drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LogDropReason {
    #[error("input exceeds size gate")]
    InputTooLarge,
    #[error("empty input")]
    EmptyInput,
    #[error("too many fields")]
    TooManyFields,
    #[error("key too long")]
    KeyTooLong,
    #[error("value too long")]
    ValueTooLong,
    #[error("invalid character in key")]
    InvalidKeyChar,
    #[error("field missing '=' separator")]
    MissingEquals,
    #[error("quoted value missing closing quote")]
    UnterminatedQuote,
    #[error("required ts field missing")]
    MissingTimestamp,
    #[error("required level field missing")]
    MissingLevel,
    #[error("required msg field missing")]
    MissingMessage,
    #[error("ts is not an unsigned integer")]
    InvalidTimestamp,
    #[error("level is not a recognized name")]
    InvalidLevel,
}

impl LogDropReason {
    /// Number of variants, for per-reason counters.
    pub const COUNT: usize = 13;

    /// All variants in counter order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::InputTooLarge,
        Self::EmptyInput,
        Self::TooManyFields,
        Self::KeyTooLong,
        Self::ValueTooLong,
        Self::InvalidKeyChar,
        Self::MissingEquals,
        Self::UnterminatedQuote,
        Self::MissingTimestamp,
        Self::MissingLevel,
        Self::MissingMessage,
        Self::InvalidTimestamp,
        Self::InvalidLevel,
    ];

    /// Stable counter index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short identifier for logs and counters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputTooLarge => "input_too_large",
            Self::EmptyInput => "empty_input",
            Self::TooManyFields => "too_many_fields",
            Self::KeyTooLong => "key_too_long",
            Self::ValueTooLong => "value_too_long",
            Self::InvalidKeyChar => "invalid_key_char",
            Self::MissingEquals => "missing_equals",
            Self::UnterminatedQuote => "unterminated_quote",
            Self::MissingTimestamp => "missing_timestamp",
            Self::MissingLevel => "missing_level",
            Self::MissingMessage => "missing_message",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidLevel => "invalid_level",
        }
    }
}

/// One field pair. Views into the source body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogField<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

/// Parsed log record. Fixed capacity; valid only while the source body is
/// alive. `agent_id` is empty when the `agent` field was absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog<'a> {
    pub ts: u64,
    pub level: LogLevel,
    pub agent_id: &'a [u8],
    pub msg: &'a [u8],
    /// All fields in line order, required ones included, for pass-through.
    pub fields: ArrayVec<LogField<'a>, MAX_FIELDS>,
}

/// Parse a logfmt body.
///
/// O(n) in `input.len()`, bounded by [`MAX_LINE_BYTES`]; memory is bounded
/// by the fixed-capacity output record. Never panics on any input.
pub fn parse_log(input: &[u8]) -> Result<ParsedLog<'_>, LogDropReason> {
    if input.len() > MAX_LINE_BYTES {
        return Err(LogDropReason::InputTooLarge);
    }

    let input = trim_trailing(input);
    if input.is_empty() {
        return Err(LogDropReason::EmptyInput);
    }

    let mut out = ParsedLog {
        ts: 0,
        level: LogLevel::Info,
        agent_id: &[],
        msg: &[],
        fields: ArrayVec::new(),
    };

    let mut has_ts = false;
    let mut has_level = false;
    let mut has_msg = false;

    let mut pos = 0usize;
    while pos < input.len() {
        while matches!(input.get(pos), Some(b' ' | b'\t')) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        if out.fields.is_full() {
            return Err(LogDropReason::TooManyFields);
        }

        let key = parse_key(input, &mut pos)?;
        if key.len() > MAX_KEY_LEN {
            return Err(LogDropReason::KeyTooLong);
        }

        if input.get(pos) != Some(&b'=') {
            return Err(LogDropReason::MissingEquals);
        }
        pos += 1;

        let value = parse_value(input, &mut pos)?;
        if value.len() > MAX_VALUE_LEN {
            return Err(LogDropReason::ValueTooLong);
        }

        out.fields.push(LogField { key, value });

        // Known fields; on duplicates the last occurrence wins.
        match key {
            b"ts" => {
                out.ts = parse_u64(value).ok_or(LogDropReason::InvalidTimestamp)?;
                has_ts = true;
            }
            b"level" => {
                out.level = LogLevel::from_bytes(value).ok_or(LogDropReason::InvalidLevel)?;
                has_level = true;
            }
            b"msg" => {
                out.msg = value;
                has_msg = true;
            }
            b"agent" => {
                out.agent_id = value;
            }
            _ => {}
        }
    }

    if !has_ts {
        return Err(LogDropReason::MissingTimestamp);
    }
    if !has_level {
        return Err(LogDropReason::MissingLevel);
    }
    if !has_msg {
        return Err(LogDropReason::MissingMessage);
    }

    Ok(out)
}

/// Trim trailing newlines, carriage returns, spaces and tabs.
fn trim_trailing(mut input: &[u8]) -> &[u8] {
    while let [rest @ .., b'\n' | b'\r' | b' ' | b'\t'] = input {
        input = rest;
    }
    input
}

/// Parse a key: `[a-z_][a-z0-9_]*`.
fn parse_key<'a>(input: &'a [u8], pos: &mut usize) -> Result<&'a [u8], LogDropReason> {
    let start = *pos;

    match input.get(*pos) {
        Some(&c) if is_key_start(c) => *pos += 1,
        Some(_) => return Err(LogDropReason::InvalidKeyChar),
        None => return Err(LogDropReason::MissingEquals),
    }

    while matches!(input.get(*pos), Some(&c) if is_key_char(c)) {
        *pos += 1;
    }

    Ok(&input[start..*pos])
}

/// Parse a value: quoted if it opens with `"`, bare otherwise. An exhausted
/// input yields an empty value.
fn parse_value<'a>(input: &'a [u8], pos: &mut usize) -> Result<&'a [u8], LogDropReason> {
    match input.get(*pos) {
        None => Ok(&[]),
        Some(b'"') => {
            *pos += 1;
            let start = *pos;
            while let Some(&c) = input.get(*pos) {
                if c == b'"' {
                    let value = &input[start..*pos];
                    *pos += 1;
                    return Ok(value);
                }
                *pos += 1;
            }
            Err(LogDropReason::UnterminatedQuote)
        }
        Some(_) => {
            let start = *pos;
            while matches!(input.get(*pos), Some(&c) if !matches!(c, b' ' | b'\t' | b'"' | b'=')) {
                *pos += 1;
            }
            Ok(&input[start..*pos])
        }
    }
}

/// Strict unsigned decimal parse: digits only, full consumption.
fn parse_u64(value: &[u8]) -> Option<u64> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(value).ok()?.parse().ok()
}

#[inline]
fn is_key_start(c: u8) -> bool {
    c.is_ascii_lowercase() || c == b'_'
}

#[inline]
fn is_key_char(c: u8) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == b'_'
}

#[cfg(test)]
#[path = "logfmt_test.rs"]
mod logfmt_test;
