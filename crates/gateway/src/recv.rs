//! Receiver
//!
//! First trust boundary: obtain one whole datagram, enforce the size cap,
//! surface the claimed source. Nothing downstream ever sees bytes beyond
//! `max_datagram_bytes`.
//!
//! Oversize detection: the receive buffer is one byte larger than the cap.
//! A datagram that fills the buffer past the cap must have exceeded it, so
//! it is dropped as truncated without MSG_TRUNC support from the platform.
//! The one limitation is that there is no distinction between "one byte
//! over" and "a megabyte over", which the pipeline does not need.
//!
//! Not thread-safe; one receiver per pipeline.

use std::io;

use weir_limiter::SourceKey;

use crate::transport::Transport;

/// Receive limits, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct RecvConfig {
    /// Hard cap on accepted datagram size.
    pub max_datagram_bytes: usize,
}

impl Default for RecvConfig {
    fn default() -> Self {
        Self {
            max_datagram_bytes: 1472,
        }
    }
}

/// One accepted datagram. Owns its bytes for the pipeline pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    pub source: SourceKey,
}

/// Result of one receive attempt.
#[derive(Debug)]
pub enum RecvOutcome {
    /// A datagram within the size cap.
    Datagram(Datagram),
    /// Peer sent more than the cap; the datagram is discarded whole.
    Truncated,
    /// No datagram available right now. Not an error.
    WouldBlock,
    /// Transport error; the OS code is surfaced for counting, never fatal.
    Error { code: i32 },
}

/// Receive counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecvMetrics {
    pub received: u64,
    pub truncated: u64,
    pub errors: u64,
}

/// First-stage receiver over an injectable transport.
pub struct Receiver<T> {
    transport: T,
    max_datagram_bytes: usize,
    // Reused across receives; one sentinel byte past the cap.
    buf: Vec<u8>,
    metrics: RecvMetrics,
}

impl<T: Transport> Receiver<T> {
    /// Create a receiver enforcing `config` over `transport`.
    pub fn new(transport: T, config: RecvConfig) -> Self {
        Self {
            transport,
            max_datagram_bytes: config.max_datagram_bytes,
            buf: vec![0u8; config.max_datagram_bytes + 1],
            metrics: RecvMetrics::default(),
        }
    }

    /// Receive one datagram, enforce the size cap, extract the source.
    pub async fn recv_one(&mut self) -> RecvOutcome {
        match self.transport.recv_from(&mut self.buf).await {
            Ok((len, peer_addr)) => {
                if len > self.max_datagram_bytes {
                    self.metrics.truncated += 1;
                    return RecvOutcome::Truncated;
                }

                self.metrics.received += 1;
                RecvOutcome::Datagram(Datagram {
                    bytes: self.buf[..len].to_vec(),
                    source: SourceKey::from_socket_addr(peer_addr),
                })
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => RecvOutcome::WouldBlock,
            Err(error) => {
                self.metrics.errors += 1;
                RecvOutcome::Error {
                    code: error.raw_os_error().unwrap_or(-1),
                }
            }
        }
    }

    /// Configured size cap.
    pub fn max_datagram_bytes(&self) -> usize {
        self.max_datagram_bytes
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> RecvMetrics {
        self.metrics
    }
}

#[cfg(test)]
#[path = "recv_test.rs"]
pub(crate) mod recv_test;
