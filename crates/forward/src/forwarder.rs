//! Bounded forwarder
//!
//! Combines the queue, the quota tracker and a sink into the last pipeline station.
//! The enqueue side is synchronous and non-blocking; the drain side awaits
//! the sink and is the only suspension point.
//!
//! An event's life: `Reserved -> Queued -> Drained -> Released`, with a
//! `Reserved -> Released` shortcut when the queue is full. The reserve /
//! push / compensate sequence is encapsulated in [`BoundedForwarder::try_forward`]
//! so a failed push can never leak a quota slot.

use crate::event::QueuedEvent;
use crate::queue::BoundedQueue;
use crate::quota::AgentQuotaTracker;
use crate::sink::Sink;

/// Forwarder bounds, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct ForwarderConfig {
    /// Total queued-event capacity.
    pub max_queue_depth: usize,
    /// Per-agent share of that capacity.
    pub max_per_agent: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            max_queue_depth: 4096,
            max_per_agent: 64,
        }
    }
}

/// Outcome of attempting to forward one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// Event accepted and queued for drain.
    Queued,
    /// Global queue at capacity; event dropped.
    DroppedQueueFull,
    /// Agent at its in-flight cap; event dropped.
    DroppedAgentQuotaExceeded,
}

/// Bounded, fair forwarding into an opaque sink.
///
/// Not thread-safe; owned by the pipeline driver.
pub struct BoundedForwarder {
    quota: AgentQuotaTracker,
    queue: BoundedQueue<QueuedEvent>,
    sink: Box<dyn Sink>,

    total_forwarded: u64,
    dropped_queue_full: u64,
    dropped_quota: u64,
    sink_failures: u64,
}

impl BoundedForwarder {
    /// Create a forwarder draining into `sink`.
    pub fn new(config: ForwarderConfig, sink: Box<dyn Sink>) -> Self {
        Self {
            quota: AgentQuotaTracker::new(config.max_per_agent),
            queue: BoundedQueue::new(config.max_queue_depth),
            sink,
            total_forwarded: 0,
            dropped_queue_full: 0,
            dropped_quota: 0,
            sink_failures: 0,
        }
    }

    /// Attempt to queue one event. Non-blocking; never suspends.
    ///
    /// Check order matters for fairness: the agent quota is taken first,
    /// then queue capacity, and the quota slot is handed back if the push
    /// fails.
    pub fn try_forward(&mut self, event: QueuedEvent) -> ForwardOutcome {
        if !self.quota.try_reserve(&event.agent_id) {
            self.dropped_quota += 1;
            return ForwardOutcome::DroppedAgentQuotaExceeded;
        }

        if let Err(event) = self.queue.try_push(event) {
            // Compensate: the reserved slot must not outlive the drop.
            self.quota.release(&event.agent_id);
            self.dropped_queue_full += 1;
            return ForwardOutcome::DroppedQueueFull;
        }

        ForwardOutcome::Queued
    }

    /// Drain one event into the sink. Returns `false` when the queue was
    /// empty.
    ///
    /// The quota slot is released on pop, regardless of what the sink does
    /// with the payload: the queue is a bound, not a retry buffer.
    pub async fn drain_one(&mut self) -> bool {
        let Some(event) = self.queue.try_pop() else {
            return false;
        };

        self.quota.release(&event.agent_id);

        match self.sink.write(&event.payload).await {
            Ok(()) => self.total_forwarded += 1,
            Err(error) => {
                self.sink_failures += 1;
                tracing::debug!(kind = %event.kind, error = %error, "sink write failed");
            }
        }

        true
    }

    /// Drain until the queue is empty. Returns the number of events
    /// processed, delivered or not.
    pub async fn drain_all(&mut self) -> usize {
        let mut drained = 0;
        while self.drain_one().await {
            drained += 1;
        }
        drained
    }

    /// Current queue depth.
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Whether the queue is empty.
    pub fn queue_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Quota tracker, for metrics and tests.
    pub fn quota_tracker(&self) -> &AgentQuotaTracker {
        &self.quota
    }

    /// Events delivered to the sink.
    pub fn total_forwarded(&self) -> u64 {
        self.total_forwarded
    }

    /// Events dropped because the queue was full.
    pub fn dropped_queue_full(&self) -> u64 {
        self.dropped_queue_full
    }

    /// Events dropped at the per-agent cap.
    pub fn dropped_quota(&self) -> u64 {
        self.dropped_quota
    }

    /// Drained events the sink refused.
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures
    }
}

#[cfg(test)]
#[path = "forwarder_test.rs"]
mod forwarder_test;
