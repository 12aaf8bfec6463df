//! Weir configuration
//!
//! TOML-based configuration with sensible defaults: an empty file (or no
//! file at all) is a valid, complete configuration. Only specify what you
//! need to change.
//!
//! All values are static at startup. Parser limits are deliberately *not*
//! here: they are compile-time constants in `weir-protocol`, because
//! bounded parsing is a property of the code, not a tunable.
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 9999
//! stats_interval = "1s"
//!
//! [limiter]
//! tokens_per_sec = 50
//! burst_tokens = 100
//!
//! [validation.logs]
//! min_level = "info"
//!
//! [forwarder]
//! max_queue_depth = 256
//! max_per_agent = 16
//! ```

mod error;
mod forwarder;
mod limiter;
mod recv;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use error::{ConfigError, Result};
pub use forwarder::ForwarderSection;
pub use limiter::LimiterSection;
pub use recv::RecvSection;
pub use server::ServerSection;
pub use validation::{LogValidationSection, MetricsValidationSection, ValidationSection};

/// Main configuration structure.
///
/// All sections are optional with defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Bind address, stats cadence, slow-sink drill.
    pub server: ServerSection,

    /// Receive limits.
    pub recv: RecvSection,

    /// Per-source admission.
    pub limiter: LimiterSection,

    /// Semantic validation.
    pub validation: ValidationSection,

    /// Forwarding bounds.
    pub forwarder: ForwarderSection,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        contents.parse()
    }

    /// Check cross-field and range constraints not expressible in serde.
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.recv.validate()?;
        self.limiter.validate()?;
        self.validation.validate()?;
        self.forwarder.validate()?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
