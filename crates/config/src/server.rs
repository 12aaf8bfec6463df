//! Server section

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Server settings: bind point, stats cadence, degradation drill.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    /// Bind address.
    pub address: String,

    /// UDP listen port.
    pub port: u16,

    /// How often the pipeline reports its counters.
    #[serde(with = "humantime_serde")]
    pub stats_interval: Duration,

    /// Per-write delay applied when the slow-sink drill is enabled
    /// (`--slow` on the command line).
    #[serde(with = "humantime_serde")]
    pub slow_sink_delay: Duration,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 9999,
            stats_interval: Duration::from_secs(1),
            slow_sink_delay: Duration::from_millis(100),
        }
    }
}

impl ServerSection {
    /// Socket address string to bind to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.stats_interval.is_zero() {
            return Err(ConfigError::invalid(
                "server",
                "stats_interval",
                "must be positive",
            ));
        }
        Ok(())
    }
}
