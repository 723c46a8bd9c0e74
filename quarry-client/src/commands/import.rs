//! Import mode: reset and populate a catalog from an encoded source

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use quarry_catalog::Catalog;
use quarry_codec::Codec;
use quarry_engine::{CancelFlag, ImportOptions, Separator, parse_size, run_import};

use crate::ImportArgs;

pub async fn handle(args: ImportArgs, cancel: CancelFlag) -> anyhow::Result<()> {
    let codec = Codec::parse(&args.encoding)?;
    let separator = Separator::parse(&args.separator)?;
    let chunk_size = parse_size(&args.chunk_size)? as usize;

    let (input, source_path): (Box<dyn Read + Send>, PathBuf) = if args.source == "-" {
        (Box::new(std::io::stdin()), PathBuf::from("-"))
    } else {
        let path = Path::new(&args.source);
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let file = std::fs::File::open(path)
            .with_context(|| format!("open source {}", path.display()))?;
        (Box::new(file), absolute)
    };

    let catalog = Catalog::create(&args.catalog)
        .with_context(|| format!("open catalog {}", args.catalog.display()))?;

    let opts = ImportOptions {
        codec,
        separator,
        chunk_size,
        acuity: args.acuity,
    };

    let summary = tokio::task::spawn_blocking(move || {
        run_import(&catalog, input, &source_path, &opts, &cancel)
    })
    .await?
    .context("import aborted; catalog is partial; rerun required")?;

    println!("records: {}", summary.records);
    if args.acuity > 0 {
        println!(
            "tokens: {} -> {} (acuity {})",
            summary.tokens_before, summary.tokens_after, args.acuity
        );
    } else {
        println!("tokens: {}", summary.tokens_before);
    }
    println!("occurrences: {}", summary.occurrences);
    println!("elapsed: {:.2?}", summary.elapsed);
    Ok(())
}
