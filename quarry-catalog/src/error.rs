//! Error types for catalog operations

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Catalog error types
#[derive(Error, Debug)]
pub enum Error {
    /// Store-level failure
    #[error("catalog store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariants violated on open; the catalog must be reset before use
    #[error("catalog is corrupt: {0}")]
    Corrupt(String),
}
