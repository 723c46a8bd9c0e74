//! External streaming decoder processes
//!
//! Above the large-file cutoff a search can hand decoding to an external
//! program (e.g. a system `zcat`) named by `QUARRY_<TAG>_DECODER`. The
//! program is invoked with the source path as its only argument and must
//! write the decoded stream to stdout. Reads are bounded by the pipe, so
//! this is a second streaming implementation of the same codec contract.

use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use tracing::{debug, warn};

use crate::{Error, Result};

/// A decoded stream backed by a child process's stdout pipe.
pub struct ExternalDecoder {
    child: Child,
    stdout: ChildStdout,
}

impl ExternalDecoder {
    /// Spawn `program <source>` with stdout piped.
    pub fn spawn(program: &str, source: &Path) -> Result<Self> {
        debug!("spawning external decoder: {program} {}", source.display());
        let mut child = Command::new(program)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::External(format!("failed to spawn {program:?}: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::External(format!("{program:?} has no stdout pipe")))?;
        Ok(Self { child, stdout })
    }
}

impl Read for ExternalDecoder {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stdout.read(buf)
    }
}

impl Drop for ExternalDecoder {
    fn drop(&mut self) {
        // The child may still be running if the caller stopped early.
        if let Ok(None) = self.child.try_wait() {
            if let Err(e) = self.child.kill() {
                warn!("failed to kill external decoder: {e}");
            }
        }
        let _ = self.child.wait();
    }
}
