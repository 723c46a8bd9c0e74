//! Record splitter: separator scanning over an unbounded decoded stream
//!
//! The splitter buffers only the current in-flight record plus the bytes of
//! a possible partial separator. A match touching the end of the buffer is
//! not committed until more input arrives, so separators that straddle a
//! chunk boundary (or could grow, like `---+`) split exactly as they would
//! over a single buffer.

use quarry_codec::DecodedStream;
use tracing::trace;

use crate::separator::Separator;
use crate::Result;

/// One record emitted by the splitter, with offsets in decoded coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRecord {
    /// 0-based emission index
    pub index: u64,
    /// Inclusive decoded start offset
    pub start: u64,
    /// Exclusive decoded end offset; `start == end` for empty records
    pub end: u64,
    /// The record's decoded bytes
    pub bytes: Vec<u8>,
}

/// Streaming splitter over a decoded byte stream.
pub struct RecordSplitter {
    stream: DecodedStream,
    separator: Separator,
    chunk_size: usize,
    buf: Vec<u8>,
    /// Decoded offset of `buf[0]`
    base: u64,
    index: u64,
    eof: bool,
    finished: bool,
}

impl RecordSplitter {
    pub fn new(stream: DecodedStream, separator: Separator, chunk_size: usize) -> Self {
        Self {
            stream,
            separator,
            chunk_size: chunk_size.max(1),
            buf: Vec::new(),
            base: 0,
            index: 0,
            eof: false,
            finished: false,
        }
    }

    /// Hand the underlying stream back (e.g. to read its final position).
    pub fn into_stream(self) -> DecodedStream {
        self.stream
    }

    /// Pull one chunk from the stream into the buffer.
    fn fill(&mut self) -> Result<()> {
        let old_len = self.buf.len();
        self.buf.resize(old_len + self.chunk_size, 0);
        let n = self.stream.read_decoded(&mut self.buf[old_len..])?;
        self.buf.truncate(old_len + n);
        if n == 0 {
            self.eof = true;
        }
        Ok(())
    }

    fn emit(&mut self, record_len: usize, consume: usize) -> SplitRecord {
        let record = SplitRecord {
            index: self.index,
            start: self.base,
            end: self.base + record_len as u64,
            bytes: self.buf[..record_len].to_vec(),
        };
        self.buf.drain(..consume);
        self.base += consume as u64;
        self.index += 1;
        trace!(
            "record {} at [{}, {})",
            record.index, record.start, record.end
        );
        record
    }

    /// Next record in order, or `None` after the trailing record.
    ///
    /// Empty records (adjacent separators) are emitted with `start == end`;
    /// a non-empty trailing record without a terminal separator is emitted
    /// with `end` at the total decoded length.
    pub fn next_record(&mut self) -> Result<Option<SplitRecord>> {
        loop {
            if self.finished {
                return Ok(None);
            }

            if let Some((sep_start, sep_end)) = self.separator.find(&self.buf) {
                // A match that touches the buffer end might extend with more
                // input; only end-of-stream makes it final.
                if sep_end < self.buf.len() || self.eof {
                    return Ok(Some(self.emit(sep_start, sep_end)));
                }
            }

            if self.eof {
                self.finished = true;
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let len = self.buf.len();
                return Ok(Some(self.emit(len, len)));
            }

            self.fill()?;
        }
    }

    /// Total decoded bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }
}

impl std::fmt::Debug for RecordSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSplitter")
            .field("base", &self.base)
            .field("index", &self.index)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_codec::Codec;
    use std::io::Cursor;

    fn split(input: &[u8], sep: &str, chunk: usize) -> Vec<SplitRecord> {
        let stream = Codec::None
            .decoder(Box::new(Cursor::new(input.to_vec())))
            .unwrap();
        let mut splitter = RecordSplitter::new(stream, Separator::parse(sep).unwrap(), chunk);
        let mut records = Vec::new();
        while let Some(record) = splitter.next_record().unwrap() {
            records.push(record);
        }
        records
    }

    #[test]
    fn test_newline_separated_records() {
        let records = split(b"alpha beta\ngamma alpha\n", "\\n", 4096);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].bytes, b"alpha beta");
        assert_eq!((records[0].start, records[0].end), (0, 10));
        assert_eq!(records[1].bytes, b"gamma alpha");
        assert_eq!((records[1].start, records[1].end), (11, 22));
    }

    #[test]
    fn test_trailing_partial_record() {
        let records = split(b"one\ntwo", "\\n", 4096);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].bytes, b"two");
        assert_eq!(records[1].end, 7);
    }

    #[test]
    fn test_adjacent_separators_yield_empty_record() {
        let records = split(b"a\n\nb\n", "\\n", 4096);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].bytes, b"");
        assert_eq!(records[1].start, records[1].end);
    }

    #[test]
    fn test_no_trailing_empty_record() {
        let records = split(b"a\n", "\\n", 4096);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_literal_separator_across_chunk_boundary() {
        // Separator "<>" straddles every 3-byte chunk edge somewhere
        let records = split(b"ab<>cd<>ef", "<>", 3);
        let bytes: Vec<&[u8]> = records.iter().map(|r| r.bytes.as_slice()).collect();
        assert_eq!(bytes, [b"ab" as &[u8], b"cd", b"ef"]);
    }

    #[test]
    fn test_regex_separator_across_chunk_boundary_matches_reference() {
        // A "-----" separator straddling 64-byte chunk edges must split the
        // same way a single-buffer pass would.
        let mut input = Vec::new();
        input.extend_from_slice(&b"x".repeat(61));
        input.extend_from_slice(b"-----");
        input.extend_from_slice(&b"y".repeat(40));
        input.extend_from_slice(b"---");
        input.extend_from_slice(&b"z".repeat(10));

        let chunked = split(&input, "re:---+", 64);
        let reference = split(&input, "re:---+", input.len() + 1);
        assert_eq!(chunked, reference);

        let bytes: Vec<Vec<u8>> = chunked.into_iter().map(|r| r.bytes).collect();
        assert_eq!(
            bytes,
            [b"x".repeat(61), b"y".repeat(40), b"z".repeat(10)]
        );
    }

    #[test]
    fn test_greedy_regex_not_cut_short_at_chunk_edge() {
        // Exactly 8 dashes ending at a chunk boundary, then more dashes in
        // the next chunk: the separator is all 11 dashes.
        let mut input = Vec::new();
        input.extend_from_slice(b"aaaaa");
        input.extend_from_slice(b"-----------");
        input.extend_from_slice(b"bbb");
        let records = split(&input, "re:---+", 8);
        let bytes: Vec<&[u8]> = records.iter().map(|r| r.bytes.as_slice()).collect();
        assert_eq!(bytes, [b"aaaaa" as &[u8], b"bbb"]);
        assert_eq!(records[1].start, 16);
    }

    #[test]
    fn test_offsets_in_decoded_coordinates_for_gzip() {
        let payload = b"first record\nsecond record\n";
        let encoded = Codec::Gzip.encode(payload).unwrap();
        let stream = Codec::Gzip
            .decoder(Box::new(Cursor::new(encoded)))
            .unwrap();
        let mut splitter =
            RecordSplitter::new(stream, Separator::parse("\\n").unwrap(), 8);
        let first = splitter.next_record().unwrap().unwrap();
        assert_eq!((first.start, first.end), (0, 12));
        let second = splitter.next_record().unwrap().unwrap();
        assert_eq!((second.start, second.end), (13, 26));
        assert!(splitter.next_record().unwrap().is_none());
    }
}
