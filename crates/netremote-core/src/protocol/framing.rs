//! Brace-balanced message framing.
//!
//! A frame is complete when the accumulated text holds as many `{` as `}`.
//! This is deliberately not a JSON-aware scan — braces inside string values
//! are miscounted — but existing clients depend on the exact behaviour, so
//! it is preserved as-is. The only addition is an accumulator cap so a peer
//! that never balances its braces cannot grow the buffer without bound.

/// Accumulator cap. Protocol frames are tens of bytes; anything near this
/// size is a broken or hostile peer.
pub const MAX_ACCUMULATED: usize = 1024 * 1024;

/// Result of feeding one chunk of received text.
#[derive(Debug, PartialEq, Eq)]
pub enum Feed {
    /// Braces are unbalanced; keep accumulating.
    Pending,
    /// A balanced frame; the accumulator has been cleared.
    Frame(String),
    /// The cap was hit before the braces balanced. The accumulator has been
    /// drained; the transport decides whether to drop the peer.
    Overflow,
}

/// Per-session frame accumulator. One per TCP client, one per serial run.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: String,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; emit the whole accumulator once braces balance.
    /// At most one frame is produced per call, mirroring the one-check-per-
    /// receive cadence of the wire loop.
    pub fn feed(&mut self, chunk: &str) -> Feed {
        self.buffer.push_str(chunk);

        if self.buffer.len() > MAX_ACCUMULATED {
            self.buffer.clear();
            return Feed::Overflow;
        }

        let opens = self.buffer.matches('{').count();
        let closes = self.buffer.matches('}').count();
        if opens == closes {
            Feed::Frame(std::mem::take(&mut self.buffer))
        } else {
            Feed::Pending
        }
    }
}
