//! Receive section

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Receive limits.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecvSection {
    /// Hard cap on accepted datagram size. The default is Ethernet MTU
    /// minus IPv4 and UDP headers: 1500 - 20 - 8.
    pub max_datagram_bytes: usize,

    /// SO_RCVBUF hint for the socket.
    pub recv_buffer_bytes: usize,
}

impl Default for RecvSection {
    fn default() -> Self {
        Self {
            max_datagram_bytes: 1472,
            recv_buffer_bytes: 256 * 1024,
        }
    }
}

impl RecvSection {
    pub(crate) fn validate(&self) -> Result<()> {
        // Below 3 bytes no datagram can carry the envelope header plus a
        // body at all.
        if self.max_datagram_bytes < 3 {
            return Err(ConfigError::invalid(
                "recv",
                "max_datagram_bytes",
                "must be at least 3",
            ));
        }
        if self.recv_buffer_bytes == 0 {
            return Err(ConfigError::invalid(
                "recv",
                "recv_buffer_bytes",
                "must be positive",
            ));
        }
        Ok(())
    }
}
