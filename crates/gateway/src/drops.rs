//! Per-reason drop counters
//!
//! Every station rejects with a typed reason; this module gives each
//! reason its own counter so overload and abuse are diagnosable from
//! counters alone, without ever logging attacker bytes.

use weir_protocol::{EnvelopeDropReason, LogDropReason, MetricsDropReason};
use weir_validate::{LogValidationDrop, MetricsValidationDrop};

/// Counters for every drop reason in the taxonomy, plus the format-sniff
/// miss that belongs to no single parser.
#[derive(Debug, Default)]
pub struct DropCounters {
    envelope: [u64; EnvelopeDropReason::COUNT],
    metrics_parse: [u64; MetricsDropReason::COUNT],
    log_parse: [u64; LogDropReason::COUNT],
    metrics_validation: [u64; MetricsValidationDrop::COUNT],
    log_validation: [u64; LogValidationDrop::COUNT],
    unknown_format: u64,
}

impl DropCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_envelope(&mut self, reason: EnvelopeDropReason) {
        self.envelope[reason.index()] += 1;
    }

    pub fn record_metrics_parse(&mut self, reason: MetricsDropReason) {
        self.metrics_parse[reason.index()] += 1;
    }

    pub fn record_log_parse(&mut self, reason: LogDropReason) {
        self.log_parse[reason.index()] += 1;
    }

    pub fn record_metrics_validation(&mut self, reason: MetricsValidationDrop) {
        self.metrics_validation[reason.index()] += 1;
    }

    pub fn record_log_validation(&mut self, reason: LogValidationDrop) {
        self.log_validation[reason.index()] += 1;
    }

    pub fn record_unknown_format(&mut self) {
        self.unknown_format += 1;
    }

    /// Total framing drops.
    pub fn envelope_total(&self) -> u64 {
        self.envelope.iter().sum()
    }

    /// Total content-parse drops, unknown-format misses included.
    pub fn parse_total(&self) -> u64 {
        self.metrics_parse.iter().sum::<u64>()
            + self.log_parse.iter().sum::<u64>()
            + self.unknown_format
    }

    /// Total semantic-validation drops.
    pub fn validation_total(&self) -> u64 {
        self.metrics_validation.iter().sum::<u64>() + self.log_validation.iter().sum::<u64>()
    }

    /// Bodies matching neither format.
    pub fn unknown_format(&self) -> u64 {
        self.unknown_format
    }

    /// All non-zero counters as `(station.reason, count)` pairs, for the
    /// periodic report.
    pub fn nonzero(&self) -> Vec<(String, u64)> {
        let mut out = Vec::new();

        for (reason, &count) in EnvelopeDropReason::ALL.iter().zip(&self.envelope) {
            if count > 0 {
                out.push((format!("envelope.{}", reason.as_str()), count));
            }
        }
        for (reason, &count) in MetricsDropReason::ALL.iter().zip(&self.metrics_parse) {
            if count > 0 {
                out.push((format!("metrics_parse.{}", reason.as_str()), count));
            }
        }
        for (reason, &count) in LogDropReason::ALL.iter().zip(&self.log_parse) {
            if count > 0 {
                out.push((format!("log_parse.{}", reason.as_str()), count));
            }
        }
        for (reason, &count) in MetricsValidationDrop::ALL.iter().zip(&self.metrics_validation) {
            if count > 0 {
                out.push((format!("metrics_validation.{}", reason.as_str()), count));
            }
        }
        for (reason, &count) in LogValidationDrop::ALL.iter().zip(&self.log_validation) {
            if count > 0 {
                out.push((format!("log_validation.{}", reason.as_str()), count));
            }
        }
        if self.unknown_format > 0 {
            out.push(("parse.unknown_format".to_owned(), self.unknown_format));
        }

        out
    }
}

#[cfg(test)]
#[path = "drops_test.rs"]
mod drops_test;
