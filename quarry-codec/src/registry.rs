//! Codec registry: tag parsing and decoder construction
//!
//! Codecs form a closed set resolved from a string tag at startup; an
//! unknown tag is an error before any data is read. Every codec builds a
//! [`DecodedStream`] from a sequential reader, and advertises whether it
//! decodes in true streaming fashion or has to buffer the input.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;

use crate::archive::{TarFirstFile, zip_first_file};
use crate::external::ExternalDecoder;
use crate::rotate::RotateReader;
use crate::text::{Ascii85Reader, HexReader, WhitespaceFilter};
use crate::uu::{LineCodec, LineFramedReader};
use crate::{DecodedStream, Error, Result};

/// Default shift for the `rot` tag.
pub const DEFAULT_ROT: i8 = 13;

/// Largest caesar shift accepted in either direction.
pub const MAX_CAESAR_SHIFT: i8 = 24;

/// The closed set of recognized encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Identity passthrough
    None,
    /// Gzip, including concatenated members
    Gzip,
    /// Raw zlib stream
    Zlib,
    /// Bzip2, including concatenated streams
    Bzip2,
    /// Brotli
    Brotli,
    /// RFC 4648 base64, whitespace ignored
    Base64,
    /// Adobe-style ascii85, whitespace ignored
    Ascii85,
    /// Hex digit pairs, whitespace ignored
    Hex,
    /// Letter rotation by N (default 13)
    Rot(i8),
    /// Caesar shift, N in [-24, 24]
    Caesar(i8),
    /// Historic uuencode framing
    Uuencode,
    /// Historic xxencode framing
    Xxencode,
    /// First regular file of a zip archive (full-buffer)
    Zip,
    /// First regular file of a tar archive
    Tar,
}

impl Codec {
    /// Resolve an encoding tag. Unknown tags and out-of-range parameters
    /// are startup-time errors.
    pub fn parse(tag: &str) -> Result<Self> {
        let lower = tag.trim().to_ascii_lowercase();
        let (base, param) = match lower.split_once(':') {
            Some((base, param)) => (base, Some(param)),
            None => (lower.as_str(), None),
        };

        let codec = match (base, param) {
            ("none", None) => Codec::None,
            ("gzip", None) => Codec::Gzip,
            ("zlib", None) => Codec::Zlib,
            ("bzip2", None) => Codec::Bzip2,
            ("brotli", None) => Codec::Brotli,
            ("base64", None) => Codec::Base64,
            ("ascii85", None) => Codec::Ascii85,
            ("hex", None) => Codec::Hex,
            ("uuencode", None) => Codec::Uuencode,
            ("xxencode", None) => Codec::Xxencode,
            ("zip", None) => Codec::Zip,
            ("tar", None) => Codec::Tar,
            ("rot", param) => {
                let shift = match param {
                    Some(p) => p.parse::<i32>().map_err(|_| {
                        Error::InvalidParameter(format!("rot shift {p:?} is not an integer"))
                    })?,
                    None => i32::from(DEFAULT_ROT),
                };
                Codec::Rot(shift.rem_euclid(26) as i8)
            }
            ("caesar", Some(p)) => {
                let shift = p.parse::<i8>().map_err(|_| {
                    Error::InvalidParameter(format!("caesar shift {p:?} is not an integer"))
                })?;
                if !(-MAX_CAESAR_SHIFT..=MAX_CAESAR_SHIFT).contains(&shift) {
                    return Err(Error::InvalidParameter(format!(
                        "caesar shift {shift} outside [-{MAX_CAESAR_SHIFT}, {MAX_CAESAR_SHIFT}]"
                    )));
                }
                Codec::Caesar(shift)
            }
            ("caesar", None) => {
                return Err(Error::InvalidParameter(
                    "caesar requires a shift, e.g. caesar:3".into(),
                ));
            }
            _ => return Err(Error::UnknownCodec(tag.to_string())),
        };
        Ok(codec)
    }

    /// Canonical tag, suitable for storing in a catalog and re-parsing.
    pub fn tag(&self) -> String {
        match self {
            Codec::None => "none".into(),
            Codec::Gzip => "gzip".into(),
            Codec::Zlib => "zlib".into(),
            Codec::Bzip2 => "bzip2".into(),
            Codec::Brotli => "brotli".into(),
            Codec::Base64 => "base64".into(),
            Codec::Ascii85 => "ascii85".into(),
            Codec::Hex => "hex".into(),
            Codec::Rot(n) => format!("rot:{n}"),
            Codec::Caesar(n) => format!("caesar:{n}"),
            Codec::Uuencode => "uuencode".into(),
            Codec::Xxencode => "xxencode".into(),
            Codec::Zip => "zip".into(),
            Codec::Tar => "tar".into(),
        }
    }

    /// Whether the decoder emits bytes without buffering the whole input.
    ///
    /// Zip needs its central directory (at the end of the file) before the
    /// first byte can be located, so it is the one full-buffer codec.
    pub fn is_streaming(&self) -> bool {
        !matches!(self, Codec::Zip)
    }

    /// Build a decoder over a sequential reader.
    pub fn decoder(&self, input: Box<dyn Read + Send>) -> Result<DecodedStream> {
        let reader: Box<dyn Read + Send> = match self {
            Codec::None => input,
            Codec::Gzip => Box::new(flate2::read::MultiGzDecoder::new(input)),
            Codec::Zlib => Box::new(flate2::read::ZlibDecoder::new(input)),
            Codec::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(input)),
            Codec::Brotli => Box::new(brotli::Decompressor::new(input, 8192)),
            Codec::Base64 => Box::new(base64::read::DecoderReader::new(
                WhitespaceFilter::new(input),
                &STANDARD,
            )),
            Codec::Ascii85 => Box::new(Ascii85Reader::new(input)),
            Codec::Hex => Box::new(HexReader::new(input)),
            Codec::Rot(n) => Box::new(RotateReader::new(input, -n)),
            Codec::Caesar(n) => Box::new(RotateReader::new(input, -n)),
            Codec::Uuencode => Box::new(LineFramedReader::new(input, LineCodec::Uuencode)),
            Codec::Xxencode => Box::new(LineFramedReader::new(input, LineCodec::Xxencode)),
            Codec::Zip => {
                let data = zip_first_file(input).map_err(|e| Error::from_read(e, 0))?;
                Box::new(Cursor::new(data))
            }
            Codec::Tar => {
                Box::new(TarFirstFile::new(input).map_err(|e| Error::from_read(e, 0))?)
            }
        };
        Ok(DecodedStream::new(reader))
    }

    /// Open a source file and wrap it in this codec's decoder.
    pub fn open_path(&self, path: &Path) -> Result<DecodedStream> {
        let file = File::open(path)?;
        self.decoder(Box::new(BufReader::new(file)))
    }

    /// Spawn the external streaming decoder named by `QUARRY_<TAG>_DECODER`,
    /// if the variable is set. Returns `Ok(None)` when it is not.
    pub fn external_decoder(&self, source: &Path) -> Result<Option<DecodedStream>> {
        match std::env::var(self.decoder_env_var()) {
            Ok(program) if !program.is_empty() => {
                let child = ExternalDecoder::spawn(&program, source)?;
                Ok(Some(DecodedStream::new(Box::new(child))))
            }
            _ => Ok(None),
        }
    }

    /// Environment variable consulted for the external decoder path.
    pub fn decoder_env_var(&self) -> String {
        let base = match self {
            Codec::None => "NONE",
            Codec::Gzip => "GZIP",
            Codec::Zlib => "ZLIB",
            Codec::Bzip2 => "BZIP2",
            Codec::Brotli => "BROTLI",
            Codec::Base64 => "BASE64",
            Codec::Ascii85 => "ASCII85",
            Codec::Hex => "HEX",
            Codec::Rot(_) => "ROT",
            Codec::Caesar(_) => "CAESAR",
            Codec::Uuencode => "UUENCODE",
            Codec::Xxencode => "XXENCODE",
            Codec::Zip => "ZIP",
            Codec::Tar => "TAR",
        };
        format!("QUARRY_{base}_DECODER")
    }
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Codec::parse(s)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}
