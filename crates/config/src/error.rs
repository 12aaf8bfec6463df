//! Configuration error types

use std::io;

use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its accepted range.
    #[error("invalid config value {section}.{field}: {reason}")]
    InvalidValue {
        section: &'static str,
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    /// Create an invalid-value error.
    #[inline]
    pub fn invalid(section: &'static str, field: &'static str, reason: &'static str) -> Self {
        Self::InvalidValue {
            section,
            field,
            reason,
        }
    }
}
