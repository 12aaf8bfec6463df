//! Tests for the agent quota tracker

use super::AgentQuotaTracker;

#[test]
fn test_reserve_and_release() {
    let mut tracker = AgentQuotaTracker::new(3);

    assert!(tracker.try_reserve("agent-a"));
    assert_eq!(tracker.in_flight_count("agent-a"), 1);

    assert!(tracker.try_reserve("agent-a"));
    assert_eq!(tracker.in_flight_count("agent-a"), 2);

    tracker.release("agent-a");
    assert_eq!(tracker.in_flight_count("agent-a"), 1);

    tracker.release("agent-a");
    assert_eq!(tracker.in_flight_count("agent-a"), 0);

    // Entry pruned at zero: the map stays bounded by in-flight events.
    assert_eq!(tracker.tracked_agents(), 0);
}

#[test]
fn test_cap_enforced() {
    let mut tracker = AgentQuotaTracker::new(2);

    assert!(tracker.try_reserve("agent-a"));
    assert!(tracker.try_reserve("agent-a"));
    assert!(!tracker.try_reserve("agent-a"));
    assert_eq!(tracker.quota_rejections(), 1);

    // A rejection leaves the count untouched.
    assert_eq!(tracker.in_flight_count("agent-a"), 2);

    // Other agents are unaffected.
    assert!(tracker.try_reserve("agent-b"));
    assert_eq!(tracker.tracked_agents(), 2);
}

#[test]
fn test_release_reopens_slot() {
    let mut tracker = AgentQuotaTracker::new(1);

    assert!(tracker.try_reserve("a"));
    assert!(!tracker.try_reserve("a"));

    tracker.release("a");
    assert!(tracker.try_reserve("a"));
}

#[test]
fn test_total_in_flight_across_agents() {
    let mut tracker = AgentQuotaTracker::new(2);

    assert!(tracker.try_reserve("a"));
    assert!(tracker.try_reserve("a"));
    assert!(tracker.try_reserve("b"));

    assert_eq!(tracker.total_in_flight(), 3);

    tracker.release("a");
    tracker.release("b");
    assert_eq!(tracker.total_in_flight(), 1);
    assert_eq!(tracker.tracked_agents(), 1);
}

#[test]
fn test_release_unknown_agent_is_noop() {
    let mut tracker = AgentQuotaTracker::new(2);

    tracker.release("never-seen");
    assert_eq!(tracker.tracked_agents(), 0);
    assert_eq!(tracker.total_in_flight(), 0);
}

#[test]
fn test_rejected_new_agent_not_tracked() {
    // A cap of zero rejects everything; rejected unknown agents must not
    // accumulate map entries.
    let mut tracker = AgentQuotaTracker::new(0);

    assert!(!tracker.try_reserve("a"));
    assert!(!tracker.try_reserve("b"));
    assert_eq!(tracker.tracked_agents(), 0);
    assert_eq!(tracker.quota_rejections(), 2);
}
