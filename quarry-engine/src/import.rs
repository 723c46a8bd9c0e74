//! Import pipeline: codec → splitter → tokenizer → catalog
//!
//! One pass over the source in bounded memory: the pipeline holds one
//! in-flight record, one separator look-behind, and one open write batch.
//! A decode failure or cancellation aborts mid-stream and leaves the
//! catalog prefix-consistent; such a catalog must be re-imported.

use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

use quarry_catalog::Catalog;
use quarry_codec::Codec;
use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::separator::Separator;
use crate::splitter::RecordSplitter;
use crate::tokenizer::record_tokens;
use crate::Result;

/// Record appends per catalog commit.
pub const BATCH_SIZE: u64 = 1000;

/// Default read chunk size in bytes (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Import configuration.
#[derive(Debug)]
pub struct ImportOptions {
    pub codec: Codec,
    pub separator: Separator,
    /// Read chunk size in bytes
    pub chunk_size: usize,
    /// Acuity threshold; 0 disables compaction
    pub acuity: u64,
}

/// Counts reported after a completed import.
#[derive(Debug, Clone, Copy)]
pub struct ImportSummary {
    pub records: u64,
    pub tokens_before: u64,
    pub tokens_after: u64,
    pub occurrences: u64,
    pub elapsed: Duration,
}

/// Run a full import of `input` into `catalog`.
///
/// `source_path` is the path recorded for later materialization; importers
/// reading standard input record `-` and must pass an override at search
/// time.
pub fn run_import(
    catalog: &Catalog,
    input: Box<dyn Read + Send>,
    source_path: &Path,
    opts: &ImportOptions,
    cancel: &CancelFlag,
) -> Result<ImportSummary> {
    let started = Instant::now();
    info!(
        "importing {} as {} (chunk {} bytes, acuity {})",
        source_path.display(),
        opts.codec,
        opts.chunk_size,
        opts.acuity
    );

    catalog.reset()?;
    catalog.put_encoding(&opts.codec.tag())?;
    catalog.put_source(source_path)?;

    let stream = opts.codec.decoder(input)?;
    let mut splitter = RecordSplitter::new(stream, opts.separator.clone(), opts.chunk_size);

    let mut records: u64 = 0;
    let mut in_batch: u64 = 0;
    catalog.begin_batch()?;

    let stream_result = loop {
        let record = match splitter.next_record() {
            Ok(Some(record)) => record,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        // Adjacent separators produce zero-width records; nothing to index.
        if record.start == record.end {
            continue;
        }

        let record_id = catalog.append_record(record.start, record.end)?;
        for token in record_tokens(&record.bytes) {
            let token_id = catalog.upsert_token(&token)?;
            catalog.add_posting(token_id, record_id)?;
        }
        records += 1;
        in_batch += 1;

        if in_batch >= BATCH_SIZE {
            catalog.commit_batch()?;
            debug!("committed batch at {records} records");
            if let Err(e) = cancel.check() {
                break Err(e);
            }
            catalog.begin_batch()?;
            in_batch = 0;
        }
    };

    if let Err(e) = stream_result {
        // Drop the open batch; everything committed so far stays.
        let _ = catalog.rollback_batch();
        warn!("import aborted after {records} records: {e}");
        return Err(e);
    }
    catalog.commit_batch()?;

    let stats = catalog.stats()?;
    let tokens_before = stats.tokens;
    let tokens_after = if opts.acuity > 0 {
        catalog.apply_acuity(opts.acuity)?.tokens_after
    } else {
        tokens_before
    };

    let summary = ImportSummary {
        records,
        tokens_before,
        tokens_after,
        occurrences: stats.occurrences,
        elapsed: started.elapsed(),
    };
    info!(
        "imported {} records, {} tokens ({} after acuity), {} occurrences in {:?}",
        summary.records,
        summary.tokens_before,
        summary.tokens_after,
        summary.occurrences,
        summary.elapsed
    );
    Ok(summary)
}
