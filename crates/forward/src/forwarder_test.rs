//! Tests for the bounded forwarder

use super::{BoundedForwarder, ForwardOutcome, ForwarderConfig};
use crate::event::{EventKind, QueuedEvent};
use crate::sink::{FailingSink, MemorySink, NullSink};

fn event(agent_id: &str) -> QueuedEvent {
    QueuedEvent {
        agent_id: agent_id.to_owned(),
        kind: EventKind::Metrics,
        payload: vec![0x01, 0x02],
    }
}

fn forwarder(max_queue_depth: usize, max_per_agent: usize) -> BoundedForwarder {
    BoundedForwarder::new(
        ForwarderConfig {
            max_queue_depth,
            max_per_agent,
        },
        Box::new(NullSink::new()),
    )
}

// ============================================================================
// Enqueue
// ============================================================================

#[test]
fn test_queued_until_quota() {
    let mut fwd = forwarder(10, 2);

    assert_eq!(fwd.try_forward(event("a")), ForwardOutcome::Queued);
    assert_eq!(fwd.try_forward(event("a")), ForwardOutcome::Queued);
    assert_eq!(
        fwd.try_forward(event("a")),
        ForwardOutcome::DroppedAgentQuotaExceeded
    );

    assert_eq!(fwd.queue_depth(), 2);
    assert_eq!(fwd.dropped_quota(), 1);
}

#[test]
fn test_queue_full_compensates_quota() {
    let mut fwd = forwarder(1, 10);

    assert_eq!(fwd.try_forward(event("a")), ForwardOutcome::Queued);
    assert_eq!(fwd.try_forward(event("b")), ForwardOutcome::DroppedQueueFull);

    // The failed push must hand back b's quota slot.
    assert_eq!(fwd.quota_tracker().in_flight_count("b"), 0);
    assert_eq!(fwd.quota_tracker().total_in_flight(), 1);
    assert_eq!(fwd.dropped_queue_full(), 1);
}

#[test]
fn test_conservation_invariant() {
    let mut fwd = forwarder(8, 3);

    for agent in ["a", "a", "b", "c", "c", "c", "c"] {
        let _ = fwd.try_forward(event(agent));
    }

    // sum of quota counts == queue depth, with c capped at 3.
    assert_eq!(fwd.quota_tracker().total_in_flight(), fwd.queue_depth());
    assert_eq!(fwd.queue_depth(), 6);
    assert_eq!(fwd.quota_tracker().in_flight_count("c"), 3);
}

// ============================================================================
// Drain
// ============================================================================

#[tokio::test]
async fn test_drain_delivers_in_fifo_order() {
    let sink = MemorySink::new();
    let handle = sink.handle();
    let mut fwd = BoundedForwarder::new(ForwarderConfig::default(), Box::new(sink));

    for payload in [b"one".to_vec(), b"two".to_vec(), b"three".to_vec()] {
        let outcome = fwd.try_forward(QueuedEvent {
            agent_id: "a".into(),
            kind: EventKind::Log,
            payload,
        });
        assert_eq!(outcome, ForwardOutcome::Queued);
    }

    assert_eq!(fwd.drain_all().await, 3);

    let written = handle.lock().unwrap();
    assert_eq!(*written, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
}

#[tokio::test]
async fn test_drain_empty_queue() {
    let mut fwd = forwarder(4, 2);
    assert!(!fwd.drain_one().await);
    assert_eq!(fwd.drain_all().await, 0);
}

#[tokio::test]
async fn test_drain_releases_quota() {
    let mut fwd = forwarder(4, 1);

    assert_eq!(fwd.try_forward(event("a")), ForwardOutcome::Queued);
    assert_eq!(
        fwd.try_forward(event("a")),
        ForwardOutcome::DroppedAgentQuotaExceeded
    );

    assert!(fwd.drain_one().await);

    // Slot free again after drain.
    assert_eq!(fwd.try_forward(event("a")), ForwardOutcome::Queued);
}

// ============================================================================
// Fairness scenario: 5 agents x 3 attempts, depth 10, quota 2
// ============================================================================

#[tokio::test]
async fn test_fairness_across_agents() {
    let mut fwd = forwarder(10, 2);
    let agents = ["a1", "a2", "a3", "a4", "a5"];

    let mut queued = 0;
    let mut quota_drops = 0;
    for agent in agents {
        for _ in 0..3 {
            match fwd.try_forward(event(agent)) {
                ForwardOutcome::Queued => queued += 1,
                ForwardOutcome::DroppedAgentQuotaExceeded => quota_drops += 1,
                ForwardOutcome::DroppedQueueFull => unreachable!("depth covers all quotas"),
            }
        }
    }

    assert_eq!(queued, 10);
    assert_eq!(quota_drops, 5);
    assert_eq!(fwd.queue_depth(), 10);

    assert_eq!(fwd.drain_all().await, 10);
    assert_eq!(fwd.queue_depth(), 0);
    assert_eq!(fwd.quota_tracker().tracked_agents(), 0);
    assert_eq!(fwd.total_forwarded(), 10);
}

// ============================================================================
// Failing sink
// ============================================================================

#[tokio::test]
async fn test_failing_sink_counts_and_releases() {
    let mut fwd = BoundedForwarder::new(
        ForwarderConfig {
            max_queue_depth: 4,
            max_per_agent: 2,
        },
        Box::new(FailingSink::new()),
    );

    assert_eq!(fwd.try_forward(event("a")), ForwardOutcome::Queued);
    assert_eq!(fwd.try_forward(event("b")), ForwardOutcome::Queued);

    assert!(fwd.drain_one().await);
    assert!(fwd.drain_one().await);

    assert!(fwd.queue_empty());
    assert_eq!(fwd.sink_failures(), 2);
    assert_eq!(fwd.total_forwarded(), 0);
    assert_eq!(fwd.quota_tracker().tracked_agents(), 0);

    // Failures do not wedge subsequent enqueues for the same agents.
    assert_eq!(fwd.try_forward(event("a")), ForwardOutcome::Queued);
    assert_eq!(fwd.try_forward(event("b")), ForwardOutcome::Queued);
}

#[tokio::test]
async fn test_bounds_hold_under_churn() {
    let mut fwd = forwarder(4, 2);

    for round in 0..50 {
        for agent in ["a", "b", "c", "d"] {
            let _ = fwd.try_forward(event(agent));
            assert!(fwd.queue_depth() <= 4);
            assert!(fwd.quota_tracker().in_flight_count(agent) <= 2);
        }
        if round % 3 == 0 {
            fwd.drain_one().await;
        }
        assert_eq!(fwd.quota_tracker().total_in_flight(), fwd.queue_depth());
    }
}
