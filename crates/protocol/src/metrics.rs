//! Metrics content parser
//!
//! Parses the JSON metrics body into a fixed-capacity record in a single
//! forward pass. This is deliberately not a general JSON parser: the schema
//! is closed (unknown keys at any depth are drops), there is no DOM, and
//! nothing is allocated based on what the input claims about itself.
//!
//! Accepted root object:
//!
//! ```json
//! {"agent_id":"web-1","seq":42,"ts":1705689600000,
//!  "metrics":[{"n":"cpu","v":75.5,"u":"percent","t":{"env":"prod"}}]}
//! ```
//!
//! `agent_id`, `seq` and `metrics` are required; `ts` is optional and
//! defaults to 0. Per metric, `n` and `v` are required; `u` and `t` are
//! optional. Numbers accept integer, decimal and scientific forms. String
//! escapes `\\` and `\"` are skipped over; everything else passes through
//! as literal bytes, UTF-8 uninterpreted. Returned string fields are raw
//! views into the input, escape sequences included.

use arrayvec::ArrayVec;
use thiserror::Error;

/// Pre-parse size gate.
pub const MAX_INPUT_BYTES: usize = 65536;
/// Recursion guard for nested containers.
pub const MAX_NESTING_DEPTH: usize = 4;
/// Cardinality cap for the `metrics` array.
pub const MAX_METRICS: usize = 50;
/// Cardinality cap for one metric's tag object.
pub const MAX_TAGS: usize = 8;
/// Length cap for `agent_id`.
pub const MAX_AGENT_ID_LEN: usize = 64;
/// Length cap for a metric name.
pub const MAX_METRIC_NAME_LEN: usize = 128;
/// Length cap for a unit.
pub const MAX_UNIT_LEN: usize = 16;
/// Length cap for a tag key.
pub const MAX_TAG_KEY_LEN: usize = 64;
/// Length cap for a tag value.
pub const MAX_TAG_VALUE_LEN: usize = 64;

/// Metrics parse drops. One variant per recognizable failure; the parser
/// never inspects these, it only produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MetricsDropReason {
    #[error("input exceeds size gate")]
    InputTooLarge,
    #[error("malformed JSON")]
    InvalidJson,
    #[error("nesting exceeds depth limit")]
    NestingTooDeep,
    #[error("missing required root field")]
    MissingRequiredField,
    #[error("field not in schema")]
    UnexpectedField,
    #[error("field has wrong type")]
    InvalidFieldType,
    #[error("agent_id too long")]
    AgentIdTooLong,
    #[error("agent_id contains invalid characters")]
    AgentIdInvalidChars,
    #[error("metrics array too long")]
    TooManyMetrics,
    #[error("metric missing name")]
    MetricMissingName,
    #[error("metric missing value")]
    MetricMissingValue,
    #[error("metric value is not a number")]
    MetricValueNotNumber,
    #[error("metric name too long")]
    MetricNameTooLong,
    #[error("unit too long")]
    UnitTooLong,
    #[error("too many tags")]
    TooManyTags,
    #[error("tag key too long")]
    TagKeyTooLong,
    #[error("tag value too long")]
    TagValueTooLong,
}

impl MetricsDropReason {
    /// Number of variants, for per-reason counters.
    pub const COUNT: usize = 17;

    /// All variants in counter order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::InputTooLarge,
        Self::InvalidJson,
        Self::NestingTooDeep,
        Self::MissingRequiredField,
        Self::UnexpectedField,
        Self::InvalidFieldType,
        Self::AgentIdTooLong,
        Self::AgentIdInvalidChars,
        Self::TooManyMetrics,
        Self::MetricMissingName,
        Self::MetricMissingValue,
        Self::MetricValueNotNumber,
        Self::MetricNameTooLong,
        Self::UnitTooLong,
        Self::TooManyTags,
        Self::TagKeyTooLong,
        Self::TagValueTooLong,
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
            Self::InvalidJson => "invalid_json",
            Self::NestingTooDeep => "nesting_too_deep",
            Self::MissingRequiredField => "missing_required_field",
            Self::UnexpectedField => "unexpected_field",
            Self::InvalidFieldType => "invalid_field_type",
            Self::AgentIdTooLong => "agent_id_too_long",
            Self::AgentIdInvalidChars => "agent_id_invalid_chars",
            Self::TooManyMetrics => "too_many_metrics",
            Self::MetricMissingName => "metric_missing_name",
            Self::MetricMissingValue => "metric_missing_value",
            Self::MetricValueNotNumber => "metric_value_not_number",
            Self::MetricNameTooLong => "metric_name_too_long",
            Self::UnitTooLong => "unit_too_long",
            Self::TooManyTags => "too_many_tags",
            Self::TagKeyTooLong => "tag_key_too_long",
            Self::TagValueTooLong => "tag_value_too_long",
        }
    }
}

/// One tag pair. Views into the source body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricTag<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

/// One metric entry. String fields are views into the source body; `unit`
/// is empty when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric<'a> {
    pub name: &'a [u8],
    pub value: f64,
    pub unit: &'a [u8],
    pub tags: ArrayVec<MetricTag<'a>, MAX_TAGS>,
}

/// Parsed metrics record. Fixed capacity; valid only while the source body
/// is alive. `ts` is 0 when the field was absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMetrics<'a> {
    pub agent_id: &'a [u8],
    pub seq: u32,
    pub ts: u64,
    pub metrics: ArrayVec<Metric<'a>, MAX_METRICS>,
}

/// Parse a metrics body.
///
/// O(n) in `input.len()`, bounded by [`MAX_INPUT_BYTES`]; memory is bounded
/// by the fixed-capacity output record. Never panics on any input.
pub fn parse_metrics(input: &[u8]) -> Result<ParsedMetrics<'_>, MetricsDropReason> {
    Parser::new(input).parse_root()
}

/// Single-pass cursor over the input bytes.
struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_root(mut self) -> Result<ParsedMetrics<'a>, MetricsDropReason> {
        // Size gate before any scanning.
        if self.input.len() > MAX_INPUT_BYTES {
            return Err(MetricsDropReason::InputTooLarge);
        }

        self.skip_whitespace();
        if !self.eat(b'{') {
            return Err(MetricsDropReason::InvalidJson);
        }

        let mut out = ParsedMetrics {
            agent_id: &[],
            seq: 0,
            ts: 0,
            metrics: ArrayVec::new(),
        };

        let mut has_agent_id = false;
        let mut has_seq = false;
        let mut has_metrics = false;

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            // Empty root object cannot carry the required fields.
            return Err(MetricsDropReason::MissingRequiredField);
        }

        loop {
            self.skip_whitespace();

            let key = self
                .parse_string()
                .ok_or(MetricsDropReason::InvalidJson)?;

            self.skip_whitespace();
            if !self.eat(b':') {
                return Err(MetricsDropReason::InvalidJson);
            }
            self.skip_whitespace();

            match key {
                b"agent_id" => {
                    let val = self
                        .parse_string()
                        .ok_or(MetricsDropReason::InvalidFieldType)?;
                    if val.len() > MAX_AGENT_ID_LEN {
                        return Err(MetricsDropReason::AgentIdTooLong);
                    }
                    if !agent_id_chars_ok(val) {
                        return Err(MetricsDropReason::AgentIdInvalidChars);
                    }
                    out.agent_id = val;
                    has_agent_id = true;
                }
                b"seq" => {
                    let val = self
                        .parse_unsigned()
                        .ok_or(MetricsDropReason::InvalidFieldType)?;
                    out.seq =
                        u32::try_from(val).map_err(|_| MetricsDropReason::InvalidFieldType)?;
                    has_seq = true;
                }
                b"ts" => {
                    out.ts = self
                        .parse_unsigned()
                        .ok_or(MetricsDropReason::InvalidFieldType)?;
                }
                b"metrics" => {
                    self.parse_metrics_array(&mut out.metrics)?;
                    has_metrics = true;
                }
                _ => return Err(MetricsDropReason::UnexpectedField),
            }

            self.skip_whitespace();
            if self.peek() == Some(b'}') {
                self.bump();
                break;
            }
            if !self.eat(b',') {
                return Err(MetricsDropReason::InvalidJson);
            }
        }

        if !has_agent_id || !has_seq || !has_metrics {
            return Err(MetricsDropReason::MissingRequiredField);
        }

        Ok(out)
    }

    fn parse_metrics_array(
        &mut self,
        out: &mut ArrayVec<Metric<'a>, MAX_METRICS>,
    ) -> Result<(), MetricsDropReason> {
        if !self.eat(b'[') {
            return Err(MetricsDropReason::InvalidFieldType);
        }
        self.descend()?;

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.bump();
            self.ascend();
            return Ok(());
        }

        loop {
            if out.is_full() {
                return Err(MetricsDropReason::TooManyMetrics);
            }

            let metric = self.parse_metric()?;
            out.push(metric);

            self.skip_whitespace();
            if self.peek() == Some(b']') {
                self.bump();
                self.ascend();
                return Ok(());
            }
            if !self.eat(b',') {
                return Err(MetricsDropReason::InvalidJson);
            }
            self.skip_whitespace();
        }
    }

    fn parse_metric(&mut self) -> Result<Metric<'a>, MetricsDropReason> {
        if !self.eat(b'{') {
            return Err(MetricsDropReason::InvalidJson);
        }
        self.descend()?;

        let mut metric = Metric {
            name: &[],
            value: 0.0,
            unit: &[],
            tags: ArrayVec::new(),
        };
        let mut has_name = false;
        let mut has_value = false;

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            return Err(MetricsDropReason::MetricMissingName);
        }

        loop {
            self.skip_whitespace();

            let key = self
                .parse_string()
                .ok_or(MetricsDropReason::InvalidJson)?;

            self.skip_whitespace();
            if !self.eat(b':') {
                return Err(MetricsDropReason::InvalidJson);
            }
            self.skip_whitespace();

            match key {
                b"n" => {
                    let val = self
                        .parse_string()
                        .ok_or(MetricsDropReason::InvalidFieldType)?;
                    if val.len() > MAX_METRIC_NAME_LEN {
                        return Err(MetricsDropReason::MetricNameTooLong);
                    }
                    metric.name = val;
                    has_name = true;
                }
                b"v" => {
                    metric.value = self
                        .parse_number()
                        .ok_or(MetricsDropReason::MetricValueNotNumber)?;
                    has_value = true;
                }
                b"u" => {
                    let val = self
                        .parse_string()
                        .ok_or(MetricsDropReason::InvalidFieldType)?;
                    if val.len() > MAX_UNIT_LEN {
                        return Err(MetricsDropReason::UnitTooLong);
                    }
                    metric.unit = val;
                }
                b"t" => {
                    self.parse_tags(&mut metric.tags)?;
                }
                _ => return Err(MetricsDropReason::UnexpectedField),
            }

            self.skip_whitespace();
            if self.peek() == Some(b'}') {
                self.bump();
                self.ascend();
                break;
            }
            if !self.eat(b',') {
                return Err(MetricsDropReason::InvalidJson);
            }
        }

        if !has_name {
            return Err(MetricsDropReason::MetricMissingName);
        }
        if !has_value {
            return Err(MetricsDropReason::MetricMissingValue);
        }

        Ok(metric)
    }

    fn parse_tags(
        &mut self,
        tags: &mut ArrayVec<MetricTag<'a>, MAX_TAGS>,
    ) -> Result<(), MetricsDropReason> {
        if !self.eat(b'{') {
            return Err(MetricsDropReason::InvalidFieldType);
        }
        self.descend()?;

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.bump();
            self.ascend();
            return Ok(());
        }

        loop {
            if tags.is_full() {
                return Err(MetricsDropReason::TooManyTags);
            }

            self.skip_whitespace();
            let key = self
                .parse_string()
                .ok_or(MetricsDropReason::InvalidJson)?;
            if key.len() > MAX_TAG_KEY_LEN {
                return Err(MetricsDropReason::TagKeyTooLong);
            }

            self.skip_whitespace();
            if !self.eat(b':') {
                return Err(MetricsDropReason::InvalidJson);
            }
            self.skip_whitespace();

            let value = self
                .parse_string()
                .ok_or(MetricsDropReason::InvalidFieldType)?;
            if value.len() > MAX_TAG_VALUE_LEN {
                return Err(MetricsDropReason::TagValueTooLong);
            }

            tags.push(MetricTag { key, value });

            self.skip_whitespace();
            if self.peek() == Some(b'}') {
                self.bump();
                self.ascend();
                return Ok(());
            }
            if !self.eat(b',') {
                return Err(MetricsDropReason::InvalidJson);
            }
        }
    }

    // -- cursor primitives ---------------------------------------------------

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.bump();
        }
    }

    fn descend(&mut self) -> Result<(), MetricsDropReason> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(MetricsDropReason::NestingTooDeep);
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// Parse a JSON string, returning the raw bytes between the quotes.
    /// `\\` and `\"` are skipped over; other bytes pass through untouched.
    /// Returns `None` on a missing opening quote or an unterminated string.
    fn parse_string(&mut self) -> Option<&'a [u8]> {
        if !self.eat(b'"') {
            return None;
        }

        let start = self.pos;
        while let Some(c) = self.peek() {
            match c {
                b'"' => {
                    let s = &self.input[start..self.pos];
                    self.bump();
                    return Some(s);
                }
                b'\\' => {
                    self.bump();
                    if self.peek().is_some() {
                        self.bump();
                    }
                }
                _ => self.bump(),
            }
        }
        None
    }

    /// Parse an unsigned decimal integer. Rejects sign characters and
    /// values that overflow u64.
    fn parse_unsigned(&mut self) -> Option<u64> {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
        }
        if self.pos == start {
            return None;
        }
        // Digits only, so the slice is valid ASCII.
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }

    /// Parse a JSON number: integer, decimal or scientific, with optional
    /// leading minus.
    fn parse_number(&mut self) -> Option<f64> {
        let start = self.pos;

        if self.peek() == Some(b'-') {
            self.bump();
        }

        if !matches!(self.peek(), Some(b'0'..=b'9')) {
            return None;
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
        }

        if self.peek() == Some(b'.') {
            self.bump();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.bump();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.bump();
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }

        std::str::from_utf8(&self.input[start..self.pos])
            .ok()?
            .parse()
            .ok()
    }
}

/// Parse-stage agent_id character check: `[A-Za-z0-9_.-]+`. The stricter
/// leading-letter rule is applied by semantic validation downstream.
fn agent_id_chars_ok(s: &[u8]) -> bool {
    !s.is_empty()
        && s.iter()
            .all(|&c| c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'-')
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod metrics_test;
