//! Limiter section

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Per-source admission settings.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimiterSection {
    /// LRU-bounded bucket map capacity.
    pub max_sources: usize,

    /// Sustained per-source rate.
    pub tokens_per_sec: u32,

    /// Per-source burst budget (bucket capacity).
    pub burst_tokens: u32,
}

impl Default for LimiterSection {
    fn default() -> Self {
        Self {
            max_sources: 1024,
            tokens_per_sec: 100,
            burst_tokens: 200,
        }
    }
}

impl LimiterSection {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_sources == 0 {
            return Err(ConfigError::invalid(
                "limiter",
                "max_sources",
                "must be positive",
            ));
        }
        if self.burst_tokens == 0 {
            return Err(ConfigError::invalid(
                "limiter",
                "burst_tokens",
                "must be positive",
            ));
        }
        Ok(())
    }
}
