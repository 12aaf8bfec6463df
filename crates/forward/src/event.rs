//! Queued events and canonical serialization
//!
//! Validated records hold views into the datagram buffer, which dies when
//! the pipeline pass returns. Everything crossing into the forwarder is
//! therefore an owned [`QueuedEvent`]: an owned agent id for quota
//! accounting plus an owned canonical payload.
//!
//! The canonical payload is a JSON document produced by `serde_json`.
//! Downstream treats it as opaque; the guarantees are that the agent id,
//! event kind and normalized fields are present, that its length is
//! bounded by the parser limits, and that no attacker-controlled substring
//! can escape the framing; JSON string escaping does that last job.
//! Raw bytes that are not valid UTF-8 are replaced lossily at this copy
//! boundary; the hot path upstream never interprets encodings.

use serde::Serialize;

use weir_validate::{ValidatedLog, ValidatedMetrics};

/// Kind of a forwarded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Metrics,
    Log,
}

impl EventKind {
    /// Canonical name, used in the payload and in counters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owned event, decoupled from the datagram that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEvent {
    /// Owned copy of the agent id, kept for quota release on drain.
    pub agent_id: String,
    pub kind: EventKind,
    /// Canonical serialized payload.
    pub payload: Vec<u8>,
}

// ============================================================================
// Canonical documents
// ============================================================================

#[derive(Serialize)]
struct MetricsDocument<'a> {
    kind: &'static str,
    agent_id: &'a str,
    seq: u32,
    ts: u64,
    metrics: Vec<MetricEntry>,
}

#[derive(Serialize)]
struct MetricEntry {
    n: String,
    v: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    u: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    t: Vec<(String, String)>,
}

#[derive(Serialize)]
struct LogDocument<'a> {
    kind: &'static str,
    agent_id: &'a str,
    ts: u64,
    level: &'static str,
    msg: String,
    fields: Vec<(String, String)>,
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Build the owned event for a validated metrics record.
pub fn canonical_metrics(validated: &ValidatedMetrics<'_>) -> QueuedEvent {
    let agent_id = lossy(validated.agent_id);

    let document = MetricsDocument {
        kind: EventKind::Metrics.as_str(),
        agent_id: &agent_id,
        seq: validated.seq,
        ts: validated.ts,
        metrics: validated
            .metrics
            .iter()
            .map(|metric| MetricEntry {
                n: lossy(metric.name),
                v: metric.value,
                u: (!metric.unit.is_empty()).then(|| lossy(metric.unit)),
                t: metric
                    .tags
                    .iter()
                    .map(|tag| (lossy(tag.key), lossy(tag.value)))
                    .collect(),
            })
            .collect(),
    };

    QueuedEvent {
        payload: serialize(&document),
        agent_id,
        kind: EventKind::Metrics,
    }
}

/// Build the owned event for a validated log record.
///
/// The pass-through fields keep their line order; the `msg` scalar carries
/// any truncation applied by validation.
pub fn canonical_log(validated: &ValidatedLog<'_>) -> QueuedEvent {
    let agent_id = lossy(validated.agent_id);

    let document = LogDocument {
        kind: EventKind::Log.as_str(),
        agent_id: &agent_id,
        ts: validated.ts,
        level: validated.level.as_str(),
        msg: lossy(validated.msg),
        fields: validated
            .fields
            .iter()
            .map(|field| (lossy(field.key), lossy(field.value)))
            .collect(),
    };

    QueuedEvent {
        payload: serialize(&document),
        agent_id,
        kind: EventKind::Log,
    }
}

fn serialize<T: Serialize>(document: &T) -> Vec<u8> {
    // Safe: the documents above contain only strings and numbers, which
    // cannot fail to serialize.
    serde_json::to_vec(document).expect("canonical document serialization")
}

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;
