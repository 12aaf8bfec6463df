//! Bounded forwarding
//!
//! The last trust boundary: validated events cross into owned storage here
//! and wait, briefly, for the downstream sink. Two independent bounds hold
//! under any load:
//!
//! - **Backlog bound**: a fixed-capacity FIFO caps total queued events.
//!   Downstream outage manifests as queue fill and tail-drop, never as
//!   growth.
//! - **Fairness bound**: a per-agent quota caps how much of that backlog
//!   one agent can occupy, so a single noisy agent cannot starve the rest
//!   during degradation.
//!
//! The conservation invariant ties them together: at every quiescent point
//! the quota tracker's total in-flight count equals the queue depth.
//!
//! Drops are final. The queue is not a retry buffer; a sink failure is
//! counted and the event is gone.
//!
//! Not thread-safe. One forwarder per pipeline, single owner.

mod event;
mod forwarder;
mod queue;
mod quota;
mod sink;

pub use event::{canonical_log, canonical_metrics, EventKind, QueuedEvent};
pub use forwarder::{BoundedForwarder, ForwardOutcome, ForwarderConfig};
pub use queue::BoundedQueue;
pub use quota::AgentQuotaTracker;
pub use sink::{FailingSink, MemorySink, NullSink, Sink, SinkError, SlowSink, StdoutSink};
