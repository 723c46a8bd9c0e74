//! Search engine: postings lookup and on-demand record materialization
//!
//! A query never touches a decoded copy on disk; matching records are cut
//! out of a single forward pass over the re-decoded source. The pass is
//! bounded by the last matching range, not by the file size.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use quarry_catalog::Catalog;
use quarry_codec::{Codec, DecodedStream};
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::extract::{ByteRange, RangeExtractor};
use crate::tokenizer::normalize_term;
use crate::{Error, Result};

/// Compressed size above which an external streaming decoder is preferred
/// (2 GiB).
pub const DEFAULT_LARGE_FILE_CUTOFF: u64 = 2 * 1024 * 1024 * 1024;

/// Search configuration.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Materialize from this path instead of the one stored in the catalog.
    pub source_override: Option<PathBuf>,
    pub large_file_cutoff: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            source_override: None,
            large_file_cutoff: DEFAULT_LARGE_FILE_CUTOFF,
        }
    }
}

/// One matching record, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub record_id: u64,
    pub range: ByteRange,
    pub bytes: Vec<u8>,
}

/// Outcome of a query.
#[derive(Debug, Clone, Copy)]
pub struct SearchSummary {
    pub matches: u64,
    /// True when a decode failure cut the result list short; the emitted
    /// prefix is still valid.
    pub skipped_tail: bool,
    pub elapsed: Duration,
}

/// Contiguous decoded span covering one or more record ranges.
struct Span {
    range: ByteRange,
    records: Vec<(u64, ByteRange)>,
}

/// Coalesce sorted record ranges into extraction spans.
///
/// Postings are set-unique, but adjacent records share a boundary once the
/// separator between them is empty-adjacent, and a damaged catalog could
/// overlap; merging keeps the extractor's cursor strictly forward.
fn merge_ranges(mut ranges: Vec<(u64, ByteRange)>) -> Vec<Span> {
    ranges.sort_by_key(|(id, range)| (range.start, *id));
    ranges.dedup_by_key(|(id, _)| *id);

    let mut spans: Vec<Span> = Vec::new();
    for (id, range) in ranges {
        match spans.last_mut() {
            Some(span) if range.start <= span.range.end => {
                span.range.end = span.range.end.max(range.end);
                span.records.push((id, range));
            }
            _ => spans.push(Span {
                range,
                records: vec![(id, range)],
            }),
        }
    }
    spans
}

/// Pick the decoded stream for materialization.
fn open_source(codec: Codec, path: &Path, cutoff: u64) -> Result<DecodedStream> {
    if !codec.is_streaming() {
        warn!(
            "encoding {codec} cannot stream; the whole decoded source is buffered in memory"
        );
        return Ok(codec.open_path(path)?);
    }

    let compressed_size = std::fs::metadata(path)?.len();
    if compressed_size > cutoff {
        if let Some(stream) = codec.external_decoder(path)? {
            debug!(
                "using external decoder for {} ({compressed_size} bytes > {cutoff} cutoff)",
                path.display()
            );
            return Ok(stream);
        }
        debug!("no external decoder configured; staying in-process");
    }
    Ok(codec.open_path(path)?)
}

/// Run a single-term query, invoking `on_hit` once per matching record in
/// ascending record-id order.
pub fn run_search(
    catalog: &Catalog,
    term: &str,
    opts: &SearchOptions,
    cancel: &CancelFlag,
    on_hit: &mut dyn FnMut(SearchHit) -> Result<()>,
) -> Result<SearchSummary> {
    let started = Instant::now();
    let term = normalize_term(term);

    let postings = catalog.postings_for(&term)?;
    if postings.is_empty() {
        info!("term {term:?} not in dictionary; zero results");
        return Ok(SearchSummary {
            matches: 0,
            skipped_tail: false,
            elapsed: started.elapsed(),
        });
    }
    debug!("term {term:?} has {} postings", postings.len());

    let mut ranges = Vec::with_capacity(postings.len());
    for record_id in postings {
        match catalog.record_range(record_id)? {
            Some((start, end)) => ranges.push((record_id, ByteRange { start, end })),
            None => warn!("posting references missing record {record_id}; skipping"),
        }
    }
    let spans = merge_ranges(ranges);

    let info = catalog
        .source_info()?
        .ok_or_else(|| Error::SourceUnavailable("catalog has no source row".into()))?;
    let codec = Codec::parse(&info.encoding_tag)?;
    let path = opts.source_override.clone().unwrap_or(info.path);
    if path == Path::new("-") {
        return Err(Error::SourceUnavailable(
            "catalog was imported from standard input; pass a source override".into(),
        ));
    }

    let stream = open_source(codec, &path, opts.large_file_cutoff)?;
    let mut extractor = RangeExtractor::new(stream);

    let mut matches: u64 = 0;
    let mut skipped_tail = false;
    'spans: for span in &spans {
        let bytes = match extractor.extract(span.range, cancel) {
            Ok(bytes) => bytes,
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e @ (Error::Codec(quarry_codec::Error::Decode { .. })
            | Error::SourceTruncated { .. })) => {
                // The prefix of results already emitted stays valid.
                warn!("decode failed at offset {}: {e}; skipping remaining ranges", extractor.position());
                skipped_tail = true;
                break 'spans;
            }
            Err(e) => return Err(e),
        };

        for &(record_id, range) in &span.records {
            let lo = (range.start - span.range.start) as usize;
            let hi = (range.end - span.range.start) as usize;
            on_hit(SearchHit {
                record_id,
                range,
                bytes: bytes[lo..hi].to_vec(),
            })?;
            matches += 1;
        }
    }

    let summary = SearchSummary {
        matches,
        skipped_tail,
        elapsed: started.elapsed(),
    };
    info!(
        "search {term:?}: {} matches in {:?}{}",
        summary.matches,
        summary.elapsed,
        if summary.skipped_tail { " (tail skipped)" } else { "" }
    );
    Ok(summary)
}
