//! Format sniffing
//!
//! Dispatch between the two body formats is structural and closed: the
//! first non-whitespace byte decides. A body that opens with `{` is routed
//! to the metrics parser and, if malformed, becomes a metrics drop; it is
//! never retried as logfmt. A body that opens with a logfmt key token
//! followed by `=` is routed to the log parser. Anything else matches no
//! format and is dropped without parsing.

/// Body format hint produced by [`sniff_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// JSON metrics body.
    Metrics,
    /// logfmt log body.
    Log,
}

/// Decide which content parser a body belongs to, or `None` when it matches
/// neither shape. O(key length) worst case, no allocation.
pub fn sniff_format(body: &[u8]) -> Option<BodyFormat> {
    let mut pos = 0usize;
    while matches!(body.get(pos), Some(b' ' | b'\t' | b'\n' | b'\r')) {
        pos += 1;
    }

    match body.get(pos)? {
        b'{' => Some(BodyFormat::Metrics),
        b'a'..=b'z' | b'_' => {
            // Looks like a key token; confirm it is followed by '='.
            pos += 1;
            while matches!(
                body.get(pos),
                Some(b'a'..=b'z' | b'0'..=b'9' | b'_')
            ) {
                pos += 1;
            }
            (body.get(pos) == Some(&b'=')).then_some(BodyFormat::Log)
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "sniff_test.rs"]
mod sniff_test;
