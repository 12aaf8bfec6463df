//! Downstream sink capability
//!
//! The forwarder depends on the [`Sink`] trait, never on a concrete
//! downstream. A sink write may block and may fail; failures are counted
//! by the forwarder and do not propagate. Variants here cover production
//! (stdout), testing (null, failing, memory) and degradation drills (slow
//! wrapper).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Errors surfaced by sink writes.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Underlying I/O failure.
    #[error("downstream write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Downstream refused the write.
    #[error("downstream unavailable")]
    Unavailable,
}

/// An opaque downstream consumer of canonical event payloads.
///
/// Contract: `write` may block (slow filesystem, network); it must not
/// panic. One payload per call; payload bytes are already canonically
/// framed and bounded by the pipeline.
#[async_trait]
pub trait Sink: Send {
    /// Deliver one payload downstream.
    async fn write(&mut self, payload: &[u8]) -> Result<(), SinkError>;

    /// Flush any buffered data. Default is a no-op.
    async fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

// ============================================================================
// NullSink
// ============================================================================

/// Discards every payload. For benchmarking the pipeline without I/O.
#[derive(Debug, Default)]
pub struct NullSink {
    write_count: u64,
}

impl NullSink {
    /// Create a null sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads accepted and discarded.
    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

#[async_trait]
impl Sink for NullSink {
    async fn write(&mut self, _payload: &[u8]) -> Result<(), SinkError> {
        self.write_count += 1;
        Ok(())
    }
}

// ============================================================================
// FailingSink
// ============================================================================

/// Fails every write. For exercising sink-failure accounting.
#[derive(Debug, Default)]
pub struct FailingSink {
    fail_count: u64,
}

impl FailingSink {
    /// Create a failing sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes refused so far.
    pub fn fail_count(&self) -> u64 {
        self.fail_count
    }
}

#[async_trait]
impl Sink for FailingSink {
    async fn write(&mut self, _payload: &[u8]) -> Result<(), SinkError> {
        self.fail_count += 1;
        Err(SinkError::Unavailable)
    }
}

// ============================================================================
// MemorySink
// ============================================================================

/// Collects payloads in memory, observable through a shared handle.
///
/// The forwarder consumes its sink, so tests keep the handle and inspect
/// what was written after draining.
#[derive(Debug, Default)]
pub struct MemorySink {
    written: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MemorySink {
    /// Create a memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the collected payloads.
    pub fn handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.written)
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn write(&mut self, payload: &[u8]) -> Result<(), SinkError> {
        // Lock never crosses an await; poisoning is the only failure and
        // only a panicking test produces that.
        if let Ok(mut written) = self.written.lock() {
            written.push(payload.to_vec());
        }
        Ok(())
    }
}

// ============================================================================
// StdoutSink
// ============================================================================

/// Writes one canonical JSON payload per line to stdout.
pub struct StdoutSink {
    out: tokio::io::Stdout,
    write_count: u64,
}

impl StdoutSink {
    /// Create a stdout sink.
    pub fn new() -> Self {
        Self {
            out: tokio::io::stdout(),
            write_count: 0,
        }
    }

    /// Payloads written.
    pub fn write_count(&self) -> u64 {
        self.write_count
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for StdoutSink {
    async fn write(&mut self, payload: &[u8]) -> Result<(), SinkError> {
        self.out.write_all(payload).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        self.write_count += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.out.flush().await?;
        Ok(())
    }
}

// ============================================================================
// SlowSink
// ============================================================================

/// Adds a fixed delay before delegating to an inner sink.
///
/// Simulates a degraded downstream so queue-fill and tail-drop behavior
/// can be observed end to end (the `--slow` server flag).
pub struct SlowSink {
    inner: Box<dyn Sink>,
    delay: Duration,
}

impl SlowSink {
    /// Wrap `inner`, delaying every write by `delay`.
    pub fn new(inner: Box<dyn Sink>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl Sink for SlowSink {
    async fn write(&mut self, payload: &[u8]) -> Result<(), SinkError> {
        tokio::time::sleep(self.delay).await;
        self.inner.write(payload).await
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        self.inner.flush().await
    }
}

#[cfg(test)]
#[path = "sink_test.rs"]
mod sink_test;
