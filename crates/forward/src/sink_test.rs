//! Tests for sink variants

use std::time::Duration;

use super::{FailingSink, MemorySink, NullSink, Sink, SlowSink};

#[tokio::test]
async fn test_null_sink_counts_writes() {
    let mut sink = NullSink::new();

    assert!(sink.write(b"one").await.is_ok());
    assert!(sink.write(b"two").await.is_ok());
    assert_eq!(sink.write_count(), 2);
}

#[tokio::test]
async fn test_failing_sink_always_fails() {
    let mut sink = FailingSink::new();

    assert!(sink.write(b"x").await.is_err());
    assert!(sink.write(b"y").await.is_err());
    assert_eq!(sink.fail_count(), 2);
}

#[tokio::test]
async fn test_memory_sink_collects_payloads() {
    let mut sink = MemorySink::new();
    let handle = sink.handle();

    sink.write(b"first").await.unwrap();
    sink.write(b"second").await.unwrap();

    let written = handle.lock().unwrap();
    assert_eq!(written.len(), 2);
    assert_eq!(written[0], b"first");
    assert_eq!(written[1], b"second");
}

#[tokio::test(start_paused = true)]
async fn test_slow_sink_delays_then_delegates() {
    let inner = MemorySink::new();
    let handle = inner.handle();
    let mut sink = SlowSink::new(Box::new(inner), Duration::from_millis(100));

    let start = tokio::time::Instant::now();
    sink.write(b"payload").await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(100));
    assert_eq!(handle.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_slow_sink_propagates_inner_failure() {
    let mut sink = SlowSink::new(Box::new(FailingSink::new()), Duration::ZERO);
    assert!(sink.write(b"x").await.is_err());
}
