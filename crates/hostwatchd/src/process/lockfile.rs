//! Cooperative busy marker honoured by `stop`.
//!
//! While the lock file exists the controller defers termination, giving the
//! work loop a way to finish a critical section before receiving `SIGTERM`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::PROCESS_TARGET;

/// Whether the lock file at `path` currently exists.
pub fn lock_present(path: &Path) -> bool {
    path.exists()
}

/// Holds the lock file for the duration of a busy section.
///
/// The marker creates the file on acquisition and removes it when dropped.
/// A marker built from `None` is inert, so callers need not branch on whether
/// a lock file is configured.
#[derive(Debug)]
pub struct BusyMarker {
    path: Option<PathBuf>,
}

impl BusyMarker {
    /// Creates the lock file at `path`.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        debug!(target: PROCESS_TARGET, file = %path.display(), "busy marker acquired");
        Ok(Self {
            path: Some(path.to_path_buf()),
        })
    }

    /// Creates the lock file when a path is configured.
    pub fn optional(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(path) => Self::acquire(path),
            None => Ok(Self { path: None }),
        }
    }

    /// Lock file held by this marker, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for BusyMarker {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => debug!(target: PROCESS_TARGET, file = %path.display(), "busy marker released"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => warn!(
                target: PROCESS_TARGET,
                file = %path.display(),
                error = %error,
                "failed to remove lock file"
            ),
        }
    }
}
