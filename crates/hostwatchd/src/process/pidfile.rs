//! PID file classification, claiming, and the guard that removes it.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::PROCESS_TARGET;
use super::errors::DaemonError;

/// What a read of the PID file found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidFileState {
    /// No file at the path.
    Missing,
    /// The file exists but holds only whitespace.
    Empty,
    /// The file holds text that is not a process ID.
    Invalid(String),
    /// The file holds a decimal process ID.
    Recorded(u32),
}

impl PidFileState {
    /// Returns the recorded PID when it can be signalled.
    ///
    /// `0` is never returned: `kill(0, ..)` would target the caller's whole
    /// process group.
    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Recorded(pid) if *pid > 0 => Some(*pid),
            _ => None,
        }
    }

    /// Whether the file exists at all.
    pub fn exists(&self) -> bool {
        !matches!(self, Self::Missing)
    }
}

/// Reads and classifies the PID file at `path`.
pub fn read_pid_file(path: &Path) -> Result<PidFileState, DaemonError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(PidFileState::Missing),
        Err(source) => {
            return Err(DaemonError::ReadPid {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    Ok(classify(&content))
}

fn classify(content: &str) -> PidFileState {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return PidFileState::Empty;
    }
    trimmed
        .parse::<u32>()
        .map_or_else(|_| PidFileState::Invalid(trimmed.to_owned()), PidFileState::Recorded)
}

/// Fails when the PID file already names a daemon.
///
/// Presence is only checked, not locked: two racing starts can both pass.
pub(super) fn ensure_vacant(path: &Path) -> Result<(), DaemonError> {
    match read_pid_file(path)? {
        PidFileState::Missing | PidFileState::Empty | PidFileState::Recorded(0) => Ok(()),
        PidFileState::Recorded(pid) => Err(already_running(path, pid.to_string())),
        PidFileState::Invalid(content) => Err(already_running(path, content)),
    }
}

/// Atomically creates an empty PID file, failing if any file is present.
///
/// An empty file is a rival's claim and refuses the start. A stale `0`
/// record names no process and is replaced once.
pub(super) fn claim(path: &Path) -> Result<PidFileGuard, DaemonError> {
    match try_claim(path) {
        Err(DaemonError::AlreadyRunning { content, .. }) if content == "0" => {
            warn!(target: PROCESS_TARGET, file = %path.display(), "replacing pid file recording pid 0");
            remove_file(path)?;
            try_claim(path)
        }
        other => other,
    }
}

fn try_claim(path: &Path) -> Result<PidFileGuard, DaemonError> {
    match pid_file_options().create_new(true).open(path) {
        Ok(_) => {
            info!(target: PROCESS_TARGET, file = %path.display(), "claimed pid file");
            Ok(PidFileGuard::new(path))
        }
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
            let content = fs::read_to_string(path).unwrap_or_default();
            Err(already_running(path, content.trim().to_owned()))
        }
        Err(source) => Err(DaemonError::ClaimPid {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn already_running(path: &Path, content: String) -> DaemonError {
    DaemonError::AlreadyRunning {
        path: path.to_path_buf(),
        content,
    }
}

fn pid_file_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options
}

/// Removes `path`, treating absence as success.
pub(super) fn remove_file(path: &Path) -> Result<(), DaemonError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DaemonError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Owns the PID file for the lifetime of the daemon.
///
/// Dropping the guard deletes the file, so every exit path that unwinds
/// through the controller leaves no stale record behind.
#[derive(Debug)]
pub(super) struct PidFileGuard {
    path: PathBuf,
}

impl PidFileGuard {
    pub(super) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub(super) fn write(&self, pid: u32) -> Result<(), DaemonError> {
        let pid_write = |source| DaemonError::PidWrite {
            path: self.path.clone(),
            source,
        };
        let mut options = pid_file_options();
        options.create(true).truncate(true);
        let mut file = options.open(&self.path).map_err(pid_write)?;
        writeln!(file, "{pid}").map_err(pid_write)?;
        file.sync_all().map_err(pid_write)?;
        info!(
            target: PROCESS_TARGET,
            pid,
            file = %self.path.display(),
            "pid file written"
        );
        Ok(())
    }
}

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        if let Err(error) = remove_file(&self.path) {
            warn!(
                target: PROCESS_TARGET,
                file = %self.path.display(),
                error = %error,
                "failed to remove pid file"
            );
        }
    }
}
