//! Streaming textual decoders: whitespace filtering, hex, and ascii85
//!
//! Whitespace is insignificant in all textual encodings, so the base64
//! decoder from the `base64` crate is stacked on top of [`WhitespaceFilter`];
//! hex and ascii85 carry their own framing and skip whitespace inline.
//! Invalid trailing groups fail the stream with `InvalidData`.

use std::io::{Error as IoError, ErrorKind, Read};

/// Strips ASCII whitespace from an inner byte stream.
pub struct WhitespaceFilter {
    inner: Box<dyn Read + Send>,
}

impl WhitespaceFilter {
    pub fn new(inner: Box<dyn Read + Send>) -> Self {
        Self { inner }
    }
}

impl Read for WhitespaceFilter {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                if !buf[i].is_ascii_whitespace() {
                    buf[kept] = buf[i];
                    kept += 1;
                }
            }
            if kept > 0 {
                return Ok(kept);
            }
            // Chunk was pure whitespace, pull more input.
        }
    }
}

const RAW_BUF: usize = 4096;

/// Streaming hex decoder: pairs of hex digits become one byte each.
///
/// A lone trailing digit is an invalid final group and fails the stream.
pub struct HexReader {
    inner: Box<dyn Read + Send>,
    pending: Option<u8>,
    scratch: [u8; RAW_BUF],
}

impl HexReader {
    pub fn new(inner: Box<dyn Read + Send>) -> Self {
        Self {
            inner,
            pending: None,
            scratch: [0u8; RAW_BUF],
        }
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl Read for HexReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            // Two hex chars per output byte; one leftover nibble may carry over.
            let want = (buf.len() * 2 - usize::from(self.pending.is_some())).min(RAW_BUF);
            let n = self.inner.read(&mut self.scratch[..want])?;
            if n == 0 {
                if self.pending.is_some() {
                    return Err(IoError::new(
                        ErrorKind::InvalidData,
                        "hex stream ends with a lone trailing digit",
                    ));
                }
                return Ok(0);
            }

            let mut out = 0;
            for &raw in &self.scratch[..n] {
                if raw.is_ascii_whitespace() {
                    continue;
                }
                let Some(value) = hex_value(raw) else {
                    return Err(IoError::new(
                        ErrorKind::InvalidData,
                        format!("invalid hex digit {:?}", char::from(raw)),
                    ));
                };
                match self.pending.take() {
                    Some(high) => {
                        buf[out] = (high << 4) | value;
                        out += 1;
                    }
                    None => self.pending = Some(value),
                }
            }
            if out > 0 {
                return Ok(out);
            }
        }
    }
}

/// Streaming ascii85 decoder (btoa framing, `z` shorthand, optional
/// `<~ … ~>` delimiters).
pub struct Ascii85Reader {
    inner: Box<dyn Read + Send>,
    scratch: [u8; RAW_BUF],
    raw_pos: usize,
    raw_len: usize,
    pushback: Option<u8>,
    group: [u8; 5],
    group_len: usize,
    out: [u8; 4],
    out_pos: usize,
    out_len: usize,
    started: bool,
    done: bool,
}

impl Ascii85Reader {
    pub fn new(inner: Box<dyn Read + Send>) -> Self {
        Self {
            inner,
            scratch: [0u8; RAW_BUF],
            raw_pos: 0,
            raw_len: 0,
            pushback: None,
            group: [0u8; 5],
            group_len: 0,
            out: [0u8; 4],
            out_pos: 0,
            out_len: 0,
            started: false,
            done: false,
        }
    }

    fn next_raw(&mut self) -> std::io::Result<Option<u8>> {
        if let Some(b) = self.pushback.take() {
            return Ok(Some(b));
        }
        loop {
            if self.raw_pos < self.raw_len {
                let b = self.scratch[self.raw_pos];
                self.raw_pos += 1;
                return Ok(Some(b));
            }
            let n = self.inner.read(&mut self.scratch)?;
            if n == 0 {
                return Ok(None);
            }
            self.raw_pos = 0;
            self.raw_len = n;
        }
    }

    fn decode_group(&mut self, len: usize) -> std::io::Result<()> {
        // Short final groups are padded with 'u' and emit len - 1 bytes.
        let mut padded = self.group;
        for slot in padded.iter_mut().take(5).skip(len) {
            *slot = 84;
        }
        let mut value: u64 = 0;
        for d in padded {
            value = value * 85 + u64::from(d);
        }
        if value > u64::from(u32::MAX) {
            return Err(IoError::new(
                ErrorKind::InvalidData,
                "ascii85 group overflows 32 bits",
            ));
        }
        self.out = (value as u32).to_be_bytes();
        self.out_pos = 0;
        self.out_len = if len == 5 { 4 } else { len - 1 };
        self.group_len = 0;
        Ok(())
    }

    /// Refill the output buffer. Returns false at end of stream.
    fn refill(&mut self) -> std::io::Result<bool> {
        loop {
            if self.done {
                return Ok(false);
            }
            let Some(b) = self.next_raw()? else {
                self.done = true;
                match self.group_len {
                    0 => return Ok(false),
                    1 => {
                        return Err(IoError::new(
                            ErrorKind::InvalidData,
                            "truncated ascii85 group at end of stream",
                        ));
                    }
                    len => {
                        self.decode_group(len)?;
                        return Ok(true);
                    }
                }
            };

            if b.is_ascii_whitespace() {
                continue;
            }
            if !self.started && b == b'<' {
                // "<~" opener; a bare '<' is an ordinary digit.
                match self.next_raw()? {
                    Some(b'~') => {
                        self.started = true;
                        continue;
                    }
                    other => self.pushback = other,
                }
            }
            self.started = true;

            match b {
                b'z' if self.group_len == 0 => {
                    self.out = [0u8; 4];
                    self.out_pos = 0;
                    self.out_len = 4;
                    return Ok(true);
                }
                b'~' => {
                    // "~>" closer terminates the stream; a partial group flushes.
                    self.done = true;
                    match self.group_len {
                        0 => return Ok(false),
                        1 => {
                            return Err(IoError::new(
                                ErrorKind::InvalidData,
                                "truncated ascii85 group before terminator",
                            ));
                        }
                        len => {
                            self.decode_group(len)?;
                            return Ok(true);
                        }
                    }
                }
                b'!'..=b'u' => {
                    self.group[self.group_len] = b - 33;
                    self.group_len += 1;
                    if self.group_len == 5 {
                        self.decode_group(5)?;
                        return Ok(true);
                    }
                }
                other => {
                    return Err(IoError::new(
                        ErrorKind::InvalidData,
                        format!("invalid ascii85 character {:?}", char::from(other)),
                    ));
                }
            }
        }
    }
}

impl Read for Ascii85Reader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.out_pos >= self.out_len && !self.refill()? {
            return Ok(0);
        }
        let available = self.out_len - self.out_pos;
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
        self.out_pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all<R: Read>(mut reader: R) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_hex_with_whitespace() {
        let reader = HexReader::new(Box::new(Cursor::new(b"48 65 6c\n6c 6f".to_vec())));
        assert_eq!(decode_all(reader).unwrap(), b"Hello");
    }

    #[test]
    fn test_hex_trailing_digit_fails() {
        let reader = HexReader::new(Box::new(Cursor::new(b"48656".to_vec())));
        let err = decode_all(reader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_hex_rejects_invalid_digit() {
        let reader = HexReader::new(Box::new(Cursor::new(b"48g5".to_vec())));
        assert!(decode_all(reader).is_err());
    }

    #[test]
    fn test_ascii85_round_trip_with_frame() {
        // "Man " encodes to 9jqo^ in ascii85
        let reader = Ascii85Reader::new(Box::new(Cursor::new(b"<~9jqo^~>".to_vec())));
        assert_eq!(decode_all(reader).unwrap(), b"Man ");
    }

    #[test]
    fn test_ascii85_partial_group() {
        // "Man" (3 bytes) is a 4-character final group
        let reader = Ascii85Reader::new(Box::new(Cursor::new(b"9jqo".to_vec())));
        assert_eq!(decode_all(reader).unwrap(), b"Man");
    }

    #[test]
    fn test_ascii85_z_shorthand() {
        let reader = Ascii85Reader::new(Box::new(Cursor::new(b"z".to_vec())));
        assert_eq!(decode_all(reader).unwrap(), vec![0u8; 4]);
    }

    #[test]
    fn test_ascii85_single_trailing_char_fails() {
        let reader = Ascii85Reader::new(Box::new(Cursor::new(b"9jqo^9".to_vec())));
        assert!(decode_all(reader).is_err());
    }

    #[test]
    fn test_whitespace_filter() {
        let reader = WhitespaceFilter::new(Box::new(Cursor::new(b" a b\nc\td ".to_vec())));
        assert_eq!(decode_all(reader).unwrap(), b"abcd");
    }
}
