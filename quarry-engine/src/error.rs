//! Error types for the import pipeline and search engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Codec resolution or decode failure
    #[error(transparent)]
    Codec(#[from] quarry_codec::Error),

    /// Catalog store failure
    #[error(transparent)]
    Catalog(#[from] quarry_catalog::Error),

    /// Invalid separator specification; import aborts at startup
    #[error("separator does not compile: {0}")]
    SeparatorCompile(String),

    /// Invalid size syntax (chunk size, target size)
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// Cooperative cancellation at a batch or read boundary
    #[error("operation cancelled")]
    Cancelled,

    /// The decoded stream ended before a cataloged record range
    #[error("decoded stream ended at offset {actual}, expected {expected}")]
    SourceTruncated { expected: u64, actual: u64 },

    /// No usable source path for materialization
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// Fixture generation failure
    #[error("fixture generation failed: {0}")]
    Fixture(String),
}
