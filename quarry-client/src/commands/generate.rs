//! Generate mode: build an encoded test fixture of a target size

use anyhow::Context;
use quarry_codec::Codec;
use quarry_engine::{GenerateOptions, generate, parse_size};

use crate::GenerateArgs;

pub async fn handle(args: GenerateArgs) -> anyhow::Result<()> {
    let opts = GenerateOptions {
        codec: Codec::parse(&args.encoding)?,
        target_size: parse_size(&args.size)?,
        output: args.output.clone(),
    };

    let input = args.input.clone();
    let summary = tokio::task::spawn_blocking(move || generate(&input, &opts))
        .await?
        .context("generation failed")?;

    println!("path: {}", summary.path.display());
    println!("bytes: {} ({} copies)", summary.bytes_written, summary.copies);
    println!("elapsed: {:.2?}", summary.elapsed);
    Ok(())
}
