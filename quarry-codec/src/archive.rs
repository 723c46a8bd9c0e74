//! Archive decoders: the first contained regular file becomes the stream
//!
//! Tar walks 512-byte headers and streams the first regular entry without
//! buffering the archive. Zip needs the central directory, so it is the one
//! full-buffer decoder in the registry.

use std::io::{Error as IoError, ErrorKind, Read};

const BLOCK: usize = 512;

/// Streams the first regular file out of a tar archive.
pub struct TarFirstFile {
    inner: Box<dyn Read + Send>,
    remaining: u64,
}

impl TarFirstFile {
    /// Walk entry headers until the first regular file.
    pub fn new(mut inner: Box<dyn Read + Send>) -> std::io::Result<Self> {
        let mut block = [0u8; BLOCK];
        loop {
            inner.read_exact(&mut block)?;
            if block.iter().all(|&b| b == 0) {
                return Err(IoError::new(
                    ErrorKind::InvalidData,
                    "tar archive contains no regular file",
                ));
            }

            let mut header = tar::Header::new_old();
            header.as_mut_bytes().copy_from_slice(&block);
            let size = header
                .entry_size()
                .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("bad tar header: {e}")))?;

            if header.entry_type().is_file() {
                return Ok(Self { inner, remaining: size });
            }

            // Skip this entry's data, padded to the block size.
            let mut skip = size.div_ceil(BLOCK as u64) * BLOCK as u64;
            while skip > 0 {
                let n = (skip as usize).min(BLOCK);
                inner.read_exact(&mut block[..n])?;
                skip -= n as u64;
            }
        }
    }
}

impl Read for TarFirstFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(self.remaining as usize);
        let n = self.inner.read(&mut buf[..want])?;
        if n == 0 {
            return Err(IoError::new(
                ErrorKind::UnexpectedEof,
                "tar entry truncated",
            ));
        }
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Extract the first regular file from a zip archive.
///
/// Zip lookup goes through the central directory at the end of the file, so
/// the whole archive is buffered in memory first.
pub fn zip_first_file(mut input: Box<dyn Read + Send>) -> std::io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    input.read_to_end(&mut raw)?;

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(raw))
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("bad zip archive: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("bad zip entry: {e}")))?;
        if entry.is_file() {
            let mut out = Vec::new();
            entry.read_to_end(&mut out)?;
            return Ok(out);
        }
    }

    Err(IoError::new(
        ErrorKind::InvalidData,
        "zip archive contains no regular file",
    ))
}
