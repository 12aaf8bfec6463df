//! Per-source admission control
//!
//! Every datagram source (an `(ip, port)` pair, a claim rather than an
//! identity) gets its own token bucket. Buckets live in an LRU-bounded
//! map, so total limiter state is O(`max_sources`) no matter how many
//! distinct sources an adversary forges. An overflowing source population
//! costs the quietest sources their buckets, never memory.
//!
//! The clock is injected so refill behavior is testable; a regressing
//! clock is clamped, never trusted.
//!
//! Not thread-safe. One limiter per pipeline; parallel deployments own one
//! each (share-nothing).

mod clock;
mod limiter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{Admit, SourceKey, SourceLimiter, SourceLimiterConfig};
