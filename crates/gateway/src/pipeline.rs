//! Pipeline driver
//!
//! One task alternates receive attempts with drain attempts through the
//! six stations:
//!
//! ```text
//! receive -> admit -> envelope -> parse -> validate -> forward
//!                                                        |
//!                                   drain_one  <---------+
//! ```
//!
//! Under load every accepted datagram is followed by one drain attempt;
//! when the socket is idle a ticker keeps the queue draining. Drops at any
//! station are counted, logged as counts only, and never stop the driver.
//! On shutdown the driver stops receiving, drains the queue, and reports.
//!
//! No state crosses datagrams except the limiter buckets, the forwarder
//! queue and the quota map. String views parsed from a datagram die with
//! it; everything queued is an owned copy.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use weir_config::Config;
use weir_forward::{
    canonical_log, canonical_metrics, BoundedForwarder, ForwarderConfig, Sink,
};
use weir_limiter::{Admit, SourceLimiter, SourceLimiterConfig};
use weir_protocol::{parse_envelope, parse_log, parse_metrics, sniff_format, BodyFormat};
use weir_validate::{
    validate_log, validate_metrics, LogValidationConfig, MetricValueRules,
    MetricsValidationConfig, TimestampWindow,
};

use crate::drops::DropCounters;
use crate::recv::{Datagram, Receiver, RecvConfig, RecvOutcome};
use crate::transport::Transport;

/// Idle drain cadence while no datagrams arrive.
const DRAIN_TICK: Duration = Duration::from_millis(1);

/// Final counter snapshot returned by [`Pipeline::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineReport {
    pub received: u64,
    pub truncated: u64,
    pub recv_errors: u64,
    pub source_limited: u64,
    pub envelope_drops: u64,
    pub parse_drops: u64,
    pub validation_drops: u64,
    pub queue_drops: u64,
    pub quota_drops: u64,
    pub forwarded: u64,
    pub sink_failures: u64,
}

/// The assembled six-station pipeline.
pub struct Pipeline<T> {
    receiver: Receiver<T>,
    limiter: SourceLimiter,
    metrics_rules: MetricsValidationConfig,
    log_rules: LogValidationConfig,
    forwarder: BoundedForwarder,
    drops: DropCounters,
    source_limited: u64,
    stats_interval: Duration,
}

impl<T: Transport> Pipeline<T> {
    /// Assemble the pipeline from configuration, a transport and a sink.
    pub fn new(config: &Config, transport: T, sink: Box<dyn Sink>) -> Self {
        let receiver = Receiver::new(
            transport,
            RecvConfig {
                max_datagram_bytes: config.recv.max_datagram_bytes,
            },
        );

        let limiter = SourceLimiter::new(SourceLimiterConfig {
            max_sources: config.limiter.max_sources,
            tokens_per_sec: config.limiter.tokens_per_sec,
            burst_tokens: config.limiter.burst_tokens,
        });

        let metrics_rules = MetricsValidationConfig {
            timestamp_window: TimestampWindow {
                max_age_ms: config.validation.metrics.max_age.as_millis() as u64,
                max_future_ms: config.validation.metrics.max_future.as_millis() as u64,
            },
            value_rules: MetricValueRules {
                min_value: config.validation.metrics.min_value,
                max_value: config.validation.metrics.max_value,
                reject_nan: config.validation.metrics.reject_nan,
                reject_infinity: config.validation.metrics.reject_infinity,
            },
            require_timestamp: config.validation.metrics.require_timestamp,
        };

        let log_rules = LogValidationConfig {
            timestamp_window: TimestampWindow {
                max_age_ms: config.validation.logs.max_age.as_millis() as u64,
                max_future_ms: config.validation.logs.max_future.as_millis() as u64,
            },
            min_level: config.validation.logs.min_level,
            max_message_length: config.validation.logs.max_message_length,
            truncate_oversized_message: config.validation.logs.truncate_oversized_message,
            require_agent_id: config.validation.logs.require_agent_id,
        };

        let forwarder = BoundedForwarder::new(
            ForwarderConfig {
                max_queue_depth: config.forwarder.max_queue_depth,
                max_per_agent: config.forwarder.max_per_agent,
            },
            sink,
        );

        Self {
            receiver,
            limiter,
            metrics_rules,
            log_rules,
            forwarder,
            drops: DropCounters::new(),
            source_limited: 0,
            stats_interval: config.server.stats_interval,
        }
    }

    /// Run until cancelled, then drain the queue and return the final
    /// counters.
    pub async fn run(mut self, cancel: CancellationToken) -> PipelineReport {
        tracing::info!(
            max_datagram_bytes = self.receiver.max_datagram_bytes(),
            queue_capacity = self.forwarder.queue_capacity(),
            "pipeline running"
        );

        let mut stats_tick = interval(self.stats_interval);
        stats_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut drain_tick = interval(DRAIN_TICK);
        drain_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                _ = stats_tick.tick() => self.report(),

                outcome = self.receiver.recv_one() => {
                    self.process(outcome).await;
                }

                _ = drain_tick.tick() => {
                    self.forwarder.drain_one().await;
                }
            }
        }

        // Shutdown: no more receives, flush what is queued.
        let drained = self.forwarder.drain_all().await;
        tracing::info!(drained, "pipeline stopped, queue drained");

        self.report();
        self.snapshot()
    }

    /// Handle one receive outcome.
    async fn process(&mut self, outcome: RecvOutcome) {
        match outcome {
            RecvOutcome::Datagram(datagram) => {
                self.handle_datagram(datagram);
                // One drain per accepted datagram keeps intake and
                // delivery balanced under load.
                self.forwarder.drain_one().await;
            }
            RecvOutcome::Truncated => {
                // Counted by the receiver; drop is final.
            }
            RecvOutcome::WouldBlock => {}
            RecvOutcome::Error { code } => {
                tracing::debug!(code, "transport receive error");
            }
        }
    }

    /// Run one datagram through admission, framing, parsing, validation
    /// and forwarding. Synchronous: the datagram's bytes never outlive
    /// this call.
    fn handle_datagram(&mut self, datagram: Datagram) {
        if self.limiter.admit(datagram.source) == Admit::Drop {
            self.source_limited += 1;
            return;
        }

        let body = match parse_envelope(&datagram.bytes) {
            Ok(body) => body,
            Err(reason) => {
                self.drops.record_envelope(reason);
                return;
            }
        };

        let now_ms = wall_clock_ms();

        let event = match sniff_format(body) {
            Some(BodyFormat::Metrics) => {
                let parsed = match parse_metrics(body) {
                    Ok(parsed) => parsed,
                    Err(reason) => {
                        self.drops.record_metrics_parse(reason);
                        return;
                    }
                };
                match validate_metrics(parsed, &self.metrics_rules, now_ms) {
                    Ok(validated) => canonical_metrics(&validated),
                    Err(reason) => {
                        self.drops.record_metrics_validation(reason);
                        return;
                    }
                }
            }
            Some(BodyFormat::Log) => {
                let parsed = match parse_log(body) {
                    Ok(parsed) => parsed,
                    Err(reason) => {
                        self.drops.record_log_parse(reason);
                        return;
                    }
                };
                match validate_log(parsed, &self.log_rules, now_ms) {
                    Ok(validated) => canonical_log(&validated),
                    Err(reason) => {
                        self.drops.record_log_validation(reason);
                        return;
                    }
                }
            }
            None => {
                self.drops.record_unknown_format();
                return;
            }
        };

        // The forwarder counts its own outcomes; a drop here is final
        // either way.
        let _ = self.forwarder.try_forward(event);
    }

    /// Log the counter snapshot. Counts only, never payload bytes.
    fn report(&self) {
        let recv = self.receiver.metrics();

        tracing::info!(
            received = recv.received,
            truncated = recv.truncated,
            recv_errors = recv.errors,
            source_limited = self.source_limited,
            envelope_drops = self.drops.envelope_total(),
            parse_drops = self.drops.parse_total(),
            validation_drops = self.drops.validation_total(),
            queue_drops = self.forwarder.dropped_queue_full(),
            quota_drops = self.forwarder.dropped_quota(),
            forwarded = self.forwarder.total_forwarded(),
            sink_failures = self.forwarder.sink_failures(),
            queue_depth = self.forwarder.queue_depth(),
            tracked_sources = self.limiter.tracked_count(),
            tracked_agents = self.forwarder.quota_tracker().tracked_agents(),
            "pipeline stats"
        );

        for (reason, count) in self.drops.nonzero() {
            tracing::debug!(%reason, count, "drop reason");
        }
    }

    fn snapshot(&self) -> PipelineReport {
        let recv = self.receiver.metrics();
        PipelineReport {
            received: recv.received,
            truncated: recv.truncated,
            recv_errors: recv.errors,
            source_limited: self.source_limited,
            envelope_drops: self.drops.envelope_total(),
            parse_drops: self.drops.parse_total(),
            validation_drops: self.drops.validation_total(),
            queue_drops: self.forwarder.dropped_queue_full(),
            quota_drops: self.forwarder.dropped_quota(),
            forwarded: self.forwarder.total_forwarded(),
            sink_failures: self.forwarder.sink_failures(),
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch, for timestamp windows.
fn wall_clock_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;
