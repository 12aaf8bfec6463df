//! Forwarder section

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Forwarding bounds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForwarderSection {
    /// Total queued-event capacity.
    pub max_queue_depth: usize,

    /// Per-agent share of the queue.
    pub max_per_agent: usize,
}

impl Default for ForwarderSection {
    fn default() -> Self {
        Self {
            max_queue_depth: 4096,
            max_per_agent: 64,
        }
    }
}

impl ForwarderSection {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_queue_depth == 0 {
            return Err(ConfigError::invalid(
                "forwarder",
                "max_queue_depth",
                "must be positive",
            ));
        }
        if self.max_per_agent == 0 {
            return Err(ConfigError::invalid(
                "forwarder",
                "max_per_agent",
                "must be positive",
            ));
        }
        Ok(())
    }
}
