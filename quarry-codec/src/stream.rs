//! Decoded byte stream with a position accessor
//!
//! Every decoder in the registry hands back a [`DecodedStream`], which
//! counts the bytes already emitted so that record offsets measured during
//! import line up exactly with a later re-decode of the same source.

use std::io::Read;

use crate::{Error, Result};

/// A sequential reader over decoded bytes.
///
/// `position()` is the number of decoded bytes emitted so far, which is the
/// coordinate space all record offsets are expressed in.
pub struct DecodedStream {
    inner: Box<dyn Read + Send>,
    emitted: u64,
}

impl DecodedStream {
    pub(crate) fn new(inner: Box<dyn Read + Send>) -> Self {
        Self { inner, emitted: 0 }
    }

    /// Number of decoded bytes emitted so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.emitted
    }

    /// Read a chunk of decoded bytes, mapping malformed-frame failures to
    /// [`Error::Decode`] with the current decoded offset.
    ///
    /// Returns `Ok(0)` at end of stream.
    pub fn read_decoded(&mut self, buf: &mut [u8]) -> Result<usize> {
        let offset = self.emitted;
        self.read(buf).map_err(|e| Error::from_read(e, offset))
    }
}

impl Read for DecodedStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.emitted += n as u64;
        Ok(n)
    }
}

impl std::fmt::Debug for DecodedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedStream")
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}
