//! Test fixture generation
//!
//! Builds an encoded source of a target size from a seed payload: fetch a
//! URL or read a file, take the first member if the payload is an archive,
//! encode it with the named codec, and repeat the encoded output until the
//! target length is reached. Repetition never splits an encoded copy, so
//! multi-member codecs (gzip, bzip2) decode the repetition as one stream.

use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use quarry_codec::Codec;
use tracing::{debug, info};

use crate::{Error, Result};

/// Fixture generation configuration.
#[derive(Debug)]
pub struct GenerateOptions {
    pub codec: Codec,
    /// Stop once at least this many bytes are written.
    pub target_size: u64,
    /// Output path; `None` picks an OS temporary path.
    pub output: Option<PathBuf>,
}

/// Outcome of fixture generation.
#[derive(Debug, Clone)]
pub struct GenerateSummary {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub copies: u64,
    pub elapsed: Duration,
}

/// Read the seed payload from a URL or a local file.
fn fetch_payload(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        debug!("fetching payload from {source}");
        let response = ureq::get(source)
            .call()
            .map_err(|e| Error::Fixture(format!("fetch {source}: {e}")))?;
        let mut payload = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut payload)
            .map_err(|e| Error::Fixture(format!("read {source}: {e}")))?;
        Ok(payload)
    } else {
        Ok(std::fs::read(source)?)
    }
}

/// If the payload is a zip or tar archive, swap it for its first member.
fn unwrap_archive(payload: Vec<u8>) -> Result<Vec<u8>> {
    let archive_codec = if payload.starts_with(b"PK\x03\x04") {
        Some(Codec::Zip)
    } else if payload.len() > 262 && &payload[257..262] == b"ustar" {
        Some(Codec::Tar)
    } else {
        None
    };

    let Some(codec) = archive_codec else {
        return Ok(payload);
    };
    debug!("payload is a {codec} archive; extracting first member");
    let mut stream = codec.decoder(Box::new(std::io::Cursor::new(payload)))?;
    let mut member = Vec::new();
    stream
        .read_to_end(&mut member)
        .map_err(|e| Error::Fixture(format!("archive member: {e}")))?;
    Ok(member)
}

/// Generate a fixture from `source` per `opts`.
pub fn generate(source: &str, opts: &GenerateOptions) -> Result<GenerateSummary> {
    let started = Instant::now();

    let payload = unwrap_archive(fetch_payload(source)?)?;
    if payload.is_empty() {
        return Err(Error::Fixture(format!("{source} produced an empty payload")));
    }

    let encoded = opts.codec.encode(&payload)?;

    let (mut file, path) = match &opts.output {
        Some(path) => (File::create(path)?, path.clone()),
        None => {
            let tmp = tempfile::Builder::new()
                .prefix("quarry-fixture-")
                .tempfile()?;
            tmp.keep()
                .map_err(|e| Error::Fixture(format!("keep temp file: {e}")))?
        }
    };

    let mut written: u64 = 0;
    let mut copies: u64 = 0;
    while written < opts.target_size || copies == 0 {
        file.write_all(&encoded)?;
        written += encoded.len() as u64;
        copies += 1;
    }
    file.flush()?;

    let summary = GenerateSummary {
        path,
        bytes_written: written,
        copies,
        elapsed: started.elapsed(),
    };
    info!(
        "generated {} ({} bytes, {} copies of {} encoded bytes) in {:?}",
        summary.path.display(),
        summary.bytes_written,
        summary.copies,
        encoded.len(),
        summary.elapsed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_repeats_to_target() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.txt");
        std::fs::write(&seed, b"alpha beta\n").unwrap();
        let out = dir.path().join("fixture.txt");

        let summary = generate(
            seed.to_str().unwrap(),
            &GenerateOptions {
                codec: Codec::None,
                target_size: 100,
                output: Some(out.clone()),
            },
        )
        .unwrap();

        assert_eq!(summary.copies, 10);
        assert_eq!(summary.bytes_written, 110);
        let body = std::fs::read(&out).unwrap();
        assert_eq!(body.len(), 110);
        assert!(body.starts_with(b"alpha beta\nalpha beta\n"));
    }

    #[test]
    fn test_generate_gzip_fixture_decodes_as_one_stream() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.txt");
        std::fs::write(&seed, b"record\n").unwrap();
        let out = dir.path().join("fixture.gz");

        let summary = generate(
            seed.to_str().unwrap(),
            &GenerateOptions {
                codec: Codec::Gzip,
                target_size: 1,
                output: Some(out.clone()),
            },
        )
        .unwrap();
        assert!(summary.copies >= 1);

        let mut stream = Codec::Gzip.open_path(&out).unwrap();
        let mut decoded = Vec::new();
        stream.read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded.len() as u64, 7 * summary.copies);
    }

    #[test]
    fn test_generate_unwraps_tar_seed() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.tar");
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_ustar();
        header.set_path("inner.txt").unwrap();
        header.set_size(6);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, &b"inner\n"[..]).unwrap();
        std::fs::write(&seed, builder.into_inner().unwrap()).unwrap();
        let out = dir.path().join("fixture.txt");

        generate(
            seed.to_str().unwrap(),
            &GenerateOptions {
                codec: Codec::None,
                target_size: 1,
                output: Some(out.clone()),
            },
        )
        .unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"inner\n");
    }

    #[test]
    fn test_empty_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("empty");
        std::fs::write(&seed, b"").unwrap();
        assert!(matches!(
            generate(
                seed.to_str().unwrap(),
                &GenerateOptions {
                    codec: Codec::None,
                    target_size: 10,
                    output: None,
                },
            ),
            Err(Error::Fixture(_))
        ));
    }
}
