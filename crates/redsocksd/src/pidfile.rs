//! PID file written once the daemon is running.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

const PIDFILE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::pidfile");

/// Failure to write the PID file.
#[derive(Debug, Error)]
#[error("failed to write pid file '{}': {source}", path.display())]
pub struct PidFileError {
    /// PID file path.
    pub path: PathBuf,
    #[source]
    source: io::Error,
}

/// Location of the PID file.
///
/// The file is truncated and rewritten on every start and is left in place
/// on shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Targets `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the PID file is written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `pid` in decimal followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`PidFileError`] when the file cannot be created or written.
    pub fn write(&self, pid: u32) -> Result<(), PidFileError> {
        let wrap = |source| PidFileError {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o644)
            .open(&self.path)
            .map_err(wrap)?;
        writeln!(file, "{pid}").map_err(wrap)?;
        file.sync_all().map_err(wrap)?;
        info!(
            target: PIDFILE_TARGET,
            pid,
            file = %self.path.display(),
            "pid file written"
        );
        Ok(())
    }
}
