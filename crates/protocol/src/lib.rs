//! Weir wire protocol
//!
//! Everything in this crate operates on attacker-controlled bytes, so the
//! contract is uniform across modules:
//!
//! - **No attacker-proportional allocation.** Output records are
//!   fixed-capacity; every limit is a compile-time constant.
//! - **Single pass, no backtracking.** Work is O(n) in the input length.
//! - **Typed drops.** Every rejection is an enum variant, never a string
//!   derived from the input.
//! - **Views, not copies.** Parsed string fields borrow from the input
//!   buffer and are valid only while it is alive.
//!
//! # Layers
//!
//! | Module | Boundary | Input | Output |
//! |--------|----------|-------|--------|
//! | [`envelope`] | framing | datagram payload | body view |
//! | [`sniff`] | dispatch | body | format hint |
//! | [`metrics`] | content | body | [`metrics::ParsedMetrics`] |
//! | [`logfmt`] | content | body | [`logfmt::ParsedLog`] |

pub mod envelope;
pub mod logfmt;
pub mod metrics;
pub mod sniff;

pub use envelope::{frame, parse_envelope, EnvelopeDropReason};
pub use logfmt::{parse_log, LogDropReason, LogField, LogLevel, ParsedLog};
pub use metrics::{parse_metrics, Metric, MetricTag, MetricsDropReason, ParsedMetrics};
pub use sniff::{sniff_format, BodyFormat};
