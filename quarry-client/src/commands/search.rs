//! Search mode: materialize matching records from the original source

use std::io::Write;

use anyhow::Context;
use quarry_catalog::Catalog;
use quarry_engine::{CancelFlag, SearchOptions, parse_size, run_search};

use crate::SearchArgs;

pub async fn handle(args: SearchArgs, cancel: CancelFlag) -> anyhow::Result<()> {
    let catalog = Catalog::open(&args.catalog)
        .with_context(|| format!("open catalog {}", args.catalog.display()))?;

    let opts = SearchOptions {
        source_override: args.source.clone(),
        large_file_cutoff: parse_size(&args.large_cutoff)?,
    };

    let term = args.term.clone();
    let truncate = args.truncate;
    let limit = args.limit;

    let summary = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let mut printed: u64 = 0;
        run_search(&catalog, &term, &opts, &cancel, &mut |hit| {
            if limit.is_some_and(|l| printed >= l) {
                return Ok(());
            }
            printed += 1;
            let mut out = stdout.lock();
            let shown = truncate
                .filter(|&t| t < hit.bytes.len())
                .map_or(hit.bytes.as_slice(), |t| &hit.bytes[..t]);
            let _ = out.write_all(shown);
            if shown.len() < hit.bytes.len() {
                let _ = out.write_all(b" [...]");
            }
            let _ = out.write_all(b"\n");
            Ok(())
        })
    })
    .await?
    .context("search failed")?;

    println!(
        "{} result{} in {:.2?}{}",
        summary.matches,
        if summary.matches == 1 { "" } else { "s" },
        summary.elapsed,
        if summary.skipped_tail {
            " (decode error; tail skipped)"
        } else {
            ""
        }
    );
    Ok(())
}
