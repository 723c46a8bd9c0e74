//! Encoder half of the registry, used by fixture generation
//!
//! Only buffer-encodable codecs are supported; archive and line-framed
//! formats are decode-only.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::rotate::rotate_byte;
use crate::{Codec, Error, Result};

impl Codec {
    /// One-shot encode of a payload buffer.
    pub fn encode(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            Codec::None => Ok(payload.to_vec()),
            Codec::Gzip => {
                let mut encoder =
                    flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(payload)?;
                Ok(encoder.finish()?)
            }
            Codec::Zlib => {
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(payload)?;
                Ok(encoder.finish()?)
            }
            Codec::Bzip2 => {
                let mut encoder =
                    bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
                encoder.write_all(payload)?;
                Ok(encoder.finish()?)
            }
            Codec::Brotli => {
                let mut out = Vec::new();
                let params = brotli::enc::BrotliEncoderParams::default();
                brotli::BrotliCompress(&mut std::io::Cursor::new(payload), &mut out, &params)?;
                Ok(out)
            }
            Codec::Base64 => Ok(STANDARD.encode(payload).into_bytes()),
            Codec::Hex => Ok(hex::encode(payload).into_bytes()),
            Codec::Rot(n) | Codec::Caesar(n) => {
                Ok(payload.iter().map(|&b| rotate_byte(b, *n)).collect())
            }
            Codec::Ascii85 | Codec::Uuencode | Codec::Xxencode | Codec::Zip | Codec::Tar => {
                Err(Error::EncodeUnsupported(self.tag()))
            }
        }
    }
}
