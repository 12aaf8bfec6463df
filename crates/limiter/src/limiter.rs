//! Token-bucket source limiter with LRU-bounded state

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroUsize;
use std::time::Instant;

use lru::LruCache;

use crate::clock::{Clock, SystemClock};

/// Identifies a source by IPv4 address and port, both in host byte order.
///
/// A source key is where a datagram claims to come from; nothing here is
/// authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub ip: u32,
    pub port: u16,
}

impl SourceKey {
    /// Create a key from raw parts.
    pub const fn new(ip: u32, port: u16) -> Self {
        Self { ip, port }
    }

    /// Derive a key from a peer address.
    ///
    /// IPv4 and IPv4-mapped IPv6 addresses map directly; other IPv6
    /// addresses are folded into 32 bits, which only has to be stable, not
    /// reversible, for bucketing.
    pub fn from_socket_addr(addr: SocketAddr) -> Self {
        let ip = match addr.ip() {
            IpAddr::V4(v4) => u32::from(v4),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => u32::from(v4),
                None => v6
                    .octets()
                    .chunks_exact(4)
                    .fold(0u32, |acc, chunk| {
                        acc ^ u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
                    }),
            },
        };
        Self {
            ip,
            port: addr.port(),
        }
    }
}

impl std::fmt::Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.ip.to_be_bytes();
        write!(f, "{a}.{b}.{c}.{d}:{}", self.port)
    }
}

/// Limiter tuning. All values are fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct SourceLimiterConfig {
    /// Bucket map capacity; the LRU tail is evicted beyond this.
    pub max_sources: usize,
    /// Sustained refill rate per source.
    pub tokens_per_sec: u32,
    /// Bucket capacity; also the budget handed to a fresh source.
    pub burst_tokens: u32,
}

impl Default for SourceLimiterConfig {
    fn default() -> Self {
        Self {
            max_sources: 1024,
            tokens_per_sec: 100,
            burst_tokens: 200,
        }
    }
}

/// Admission decision for one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admit {
    /// Source had budget; one token consumed.
    Allow,
    /// Source exhausted its budget; drop the datagram.
    Drop,
}

/// Token bucket state for one source.
#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn full(burst_tokens: u32, now: Instant) -> Self {
        Self {
            tokens: f64::from(burst_tokens),
            last_update: now,
        }
    }

    /// Continuous refill; fractional accumulation carries between calls.
    /// A regressing clock yields zero elapsed time, never negative tokens.
    fn refill(&mut self, now: Instant, tokens_per_sec: u32, burst_tokens: u32) {
        let elapsed = now.saturating_duration_since(self.last_update);
        let replenished = self.tokens + elapsed.as_secs_f64() * f64::from(tokens_per_sec);
        self.tokens = replenished.min(f64::from(burst_tokens));
        self.last_update = now;
    }
}

/// Per-source rate limiter: token bucket per source, LRU eviction at
/// capacity.
///
/// Invariants:
/// - tracked sources never exceed `max_sources`; memory is O(`max_sources`)
/// - each tracked source has an independent budget
/// - a fresh (or re-admitted after eviction) source starts with a full
///   burst budget
///
/// Not thread-safe; single-owner like the rest of the pipeline.
pub struct SourceLimiter<C: Clock = SystemClock> {
    config: SourceLimiterConfig,
    clock: C,
    buckets: LruCache<SourceKey, TokenBucket>,

    total_admits: u64,
    total_drops: u64,
    evictions: u64,
}

impl SourceLimiter<SystemClock> {
    /// Create a limiter on the real monotonic clock.
    pub fn new(config: SourceLimiterConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SourceLimiter<C> {
    /// Create a limiter with an injected clock.
    pub fn with_clock(config: SourceLimiterConfig, clock: C) -> Self {
        let capacity = NonZeroUsize::new(config.max_sources).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            clock,
            buckets: LruCache::new(capacity),
            total_admits: 0,
            total_drops: 0,
            evictions: 0,
        }
    }

    /// Decide admission for one datagram from `source`, consuming one token
    /// when allowed.
    ///
    /// An unseen source displaces the least-recently-used entry when the
    /// map is at capacity; a seen source is promoted to most-recently-used.
    pub fn admit(&mut self, source: SourceKey) -> Admit {
        let now = self.clock.now();

        if !self.buckets.contains(&source) {
            // push never replaces an existing key here, so any returned
            // entry is an LRU victim.
            if self
                .buckets
                .push(source, TokenBucket::full(self.config.burst_tokens, now))
                .is_some()
            {
                self.evictions += 1;
            }
        }

        // get_mut also promotes the entry to most-recently-used.
        let Some(bucket) = self.buckets.get_mut(&source) else {
            // Unreachable: the entry was inserted above. Fail closed.
            self.total_drops += 1;
            return Admit::Drop;
        };

        bucket.refill(now, self.config.tokens_per_sec, self.config.burst_tokens);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            self.total_admits += 1;
            Admit::Allow
        } else {
            self.total_drops += 1;
            Admit::Drop
        }
    }

    /// Number of sources currently tracked.
    pub fn tracked_count(&self) -> usize {
        self.buckets.len()
    }

    /// Whether a source currently holds a bucket. Does not touch LRU order.
    pub fn is_tracked(&self, source: SourceKey) -> bool {
        self.buckets.contains(&source)
    }

    /// Datagrams admitted since construction.
    pub fn total_admits(&self) -> u64 {
        self.total_admits
    }

    /// Datagrams dropped since construction.
    pub fn total_drops(&self) -> u64 {
        self.total_drops
    }

    /// Buckets evicted to make room for new sources.
    pub fn eviction_count(&self) -> u64 {
        self.evictions
    }
}

#[cfg(test)]
#[path = "limiter_test.rs"]
mod limiter_test;
