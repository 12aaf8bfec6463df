//! Envelope framing
//!
//! One datagram carries exactly one body, framed by a 2-byte big-endian
//! length prefix:
//!
//! ```text
//! [body_len: u16 BE][body: body_len bytes]
//! ```
//!
//! `body_len` counts body bytes only, excluding the header. The framing
//! check is exact in both directions: a declared length that overruns the
//! payload and unclaimed trailing bytes are both drops. Size enforcement
//! against the datagram cap happens upstream in the receiver; by the time a
//! payload reaches this parser it is already bounded.
//!
//! A zero-length body is syntactically valid here and left for the content
//! parsers to reject.

use thiserror::Error;

/// Framing validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvelopeDropReason {
    /// Payload is shorter than the 2-byte length header.
    #[error("payload too small for length header")]
    PayloadTooSmall,

    /// Declared body length overruns the payload.
    #[error("declared body length exceeds payload")]
    LengthMismatch,

    /// Payload continues past the declared body.
    #[error("trailing bytes after declared body")]
    TrailingJunk,
}

impl EnvelopeDropReason {
    /// Number of variants, for per-reason counters.
    pub const COUNT: usize = 3;

    /// All variants in counter order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::PayloadTooSmall,
        Self::LengthMismatch,
        Self::TrailingJunk,
    ];

    /// Stable counter index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short identifier for logs and counters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PayloadTooSmall => "payload_too_small",
            Self::LengthMismatch => "length_mismatch",
            Self::TrailingJunk => "trailing_junk",
        }
    }
}

/// Validate framing and return a view of the body.
///
/// No allocation, no copy. The returned slice borrows from `payload`.
pub fn parse_envelope(payload: &[u8]) -> Result<&[u8], EnvelopeDropReason> {
    if payload.len() < 2 {
        return Err(EnvelopeDropReason::PayloadTooSmall);
    }

    // Network byte order, widened before the addition so a claimed length
    // near u16::MAX cannot wrap.
    let claimed = u16::from_be_bytes([payload[0], payload[1]]) as usize;
    let required = 2 + claimed;

    if required > payload.len() {
        return Err(EnvelopeDropReason::LengthMismatch);
    }
    if required < payload.len() {
        return Err(EnvelopeDropReason::TrailingJunk);
    }

    Ok(&payload[2..required])
}

/// Frame a body into a datagram payload. Inverse of [`parse_envelope`].
///
/// Producer-side helper for tests and tooling.
///
/// # Panics
///
/// Panics if `body` exceeds `u16::MAX` bytes; the envelope header cannot
/// express a longer body.
pub fn frame(body: &[u8]) -> Vec<u8> {
    assert!(
        body.len() <= u16::MAX as usize,
        "body does not fit a u16 length header"
    );

    let mut payload = Vec::with_capacity(2 + body.len());
    payload.extend_from_slice(&(body.len() as u16).to_be_bytes());
    payload.extend_from_slice(body);
    payload
}

#[cfg(test)]
#[path = "envelope_test.rs"]
mod envelope_test;
