//! Forward-cursor range extractor over a decoded stream
//!
//! Ranges must arrive sorted and non-overlapping; the extractor discards
//! bytes up to each range start and copies the range body, never seeking
//! and never re-reading. The cursor is the decoded stream's own position.

use quarry_codec::DecodedStream;

use crate::cancel::CancelFlag;
use crate::{Error, Result};

const SKIP_BUF: usize = 64 * 1024;

/// A half-open decoded byte range to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

/// Forward-only extractor; one instance per decoded pass.
pub struct RangeExtractor {
    stream: DecodedStream,
    scratch: Vec<u8>,
}

impl RangeExtractor {
    pub fn new(stream: DecodedStream) -> Self {
        Self {
            stream,
            scratch: vec![0u8; SKIP_BUF],
        }
    }

    /// Current cursor in decoded bytes.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Materialize `range`, which must start at or after the cursor.
    pub fn extract(&mut self, range: ByteRange, cancel: &CancelFlag) -> Result<Vec<u8>> {
        debug_assert!(range.end >= range.start);
        if range.start < self.stream.position() {
            return Err(Error::SourceTruncated {
                expected: range.start,
                actual: self.stream.position(),
            });
        }

        // Discard up to the range start.
        while self.stream.position() < range.start {
            cancel.check()?;
            let gap = range.start - self.stream.position();
            let want = (gap as usize).min(SKIP_BUF);
            let n = self.stream.read_decoded(&mut self.scratch[..want])?;
            if n == 0 {
                return Err(Error::SourceTruncated {
                    expected: range.start,
                    actual: self.stream.position(),
                });
            }
        }

        // Copy the range body.
        let len = (range.end - range.start) as usize;
        let mut out = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            cancel.check()?;
            let n = self.stream.read_decoded(&mut out[filled..])?;
            if n == 0 {
                return Err(Error::SourceTruncated {
                    expected: range.end,
                    actual: self.stream.position(),
                });
            }
            filled += n;
        }
        Ok(out)
    }
}
