//! Error types for codec resolution and decoding

use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Codec error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown encoding tag
    #[error("Unknown encoding tag: {0:?}")]
    UnknownCodec(String),

    /// Invalid codec parameter (e.g. caesar shift out of range)
    #[error("Invalid codec parameter: {0}")]
    InvalidParameter(String),

    /// Malformed encoded frame
    #[error("Decode error at decoded offset {offset}: {detail}")]
    Decode { offset: u64, detail: String },

    /// External decoder process failed
    #[error("External decoder failed: {0}")]
    External(String),

    /// Codec has no encoder half
    #[error("Encoding {0:?} does not support generation")]
    EncodeUnsupported(String),
}

impl Error {
    /// Classify an IO error raised mid-stream: data errors become [`Error::Decode`]
    /// carrying the decoded offset, everything else stays [`Error::Io`].
    pub fn from_read(err: std::io::Error, offset: u64) -> Self {
        match err.kind() {
            std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => Error::Decode {
                offset,
                detail: err.to_string(),
            },
            _ => Error::Io(err),
        }
    }
}
