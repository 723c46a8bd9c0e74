//! Quarry client library
//!
//! Argument types and handlers behind the `quarry` CLI tool.

pub mod commands;

pub use crate::commands::{
    generate::handle as handle_generate, import::handle as handle_import,
    search::handle as handle_search,
};

use clap::Args;
use std::path::PathBuf;

/// Arguments for import mode.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Source file to index, or '-' for standard input
    pub source: String,

    /// Catalog directory (created if missing)
    #[arg(short = 'd', long)]
    pub catalog: PathBuf,

    /// Encoding tag (e.g. none, gzip, base64, caesar:3)
    #[arg(short, long, default_value = "none")]
    pub encoding: String,

    /// Record separator: a literal with escapes, or re:<pattern>
    #[arg(short, long, default_value = "\\n")]
    pub separator: String,

    /// Read chunk size; bare numbers are KiB (suffixes K/KB, M/MB, G/GB)
    #[arg(short, long, default_value = "64")]
    pub chunk_size: String,

    /// Drop tokens occurring in fewer than this many records (0 keeps all)
    #[arg(short, long, default_value_t = 0)]
    pub acuity: u64,
}

/// Arguments for search mode.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Whole-word token to look up
    pub term: String,

    /// Catalog directory
    #[arg(short = 'd', long)]
    pub catalog: PathBuf,

    /// Materialize from this path instead of the imported one
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Truncate each displayed record to this many bytes
    #[arg(short, long)]
    pub truncate: Option<usize>,

    /// Print at most this many records (the count still reports all)
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Compressed size above which an external decoder is preferred
    #[arg(long, default_value = "2G")]
    pub large_cutoff: String,
}

/// Arguments for generate mode.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Seed payload: a file path or an http(s) URL
    pub input: String,

    /// Target output size; bare numbers are KiB (suffixes K/KB, M/MB, G/GB)
    #[arg(short = 'n', long, default_value = "1M")]
    pub size: String,

    /// Encoding applied to the payload
    #[arg(short, long, default_value = "none")]
    pub encoding: String,

    /// Output path; omitted picks an OS temporary path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
