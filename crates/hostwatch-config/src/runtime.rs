//! Resolves the runtime artefact paths shared by every lifecycle command.
//!
//! The controller that starts the daemon and the one that later stops it may
//! run from different working directories, and the daemon itself moves to `/`
//! while detaching. Paths are therefore made absolute against the invoking
//! process's working directory before anything else touches them.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Config;

/// Canonical locations of the PID file and optional lock file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pid_path: PathBuf,
    lock_path: Option<PathBuf>,
}

impl RuntimePaths {
    /// Resolves paths from configuration and creates the PID file's directory.
    pub fn from_config(config: &Config) -> Result<Self, RuntimePathsError> {
        let paths = Self::from_config_readonly(config)?;
        if let Some(parent) = paths.pid_path.parent() {
            fs::create_dir_all(parent).map_err(|source| RuntimePathsError::RuntimeDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(paths)
    }

    /// Resolves paths without touching the filesystem.
    pub fn from_config_readonly(config: &Config) -> Result<Self, RuntimePathsError> {
        Self::new(config.pid_file(), config.lock_file())
    }

    /// Resolves explicit paths, making relative ones absolute.
    pub fn new(pid_path: &Path, lock_path: Option<&Path>) -> Result<Self, RuntimePathsError> {
        if pid_path.as_os_str().is_empty() {
            return Err(RuntimePathsError::EmptyPidPath);
        }
        Ok(Self {
            pid_path: absolutise(pid_path)?,
            lock_path: lock_path.map(absolutise).transpose()?,
        })
    }

    /// Path to the PID file.
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Path to the cooperative lock file, when one is configured.
    pub fn lock_path(&self) -> Option<&Path> {
        self.lock_path.as_deref()
    }
}

fn absolutise(path: &Path) -> Result<PathBuf, RuntimePathsError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|source| RuntimePathsError::WorkingDirectory { source })?;
    Ok(cwd.join(path))
}

/// Errors raised while resolving runtime artefact paths.
#[derive(Debug, Error)]
pub enum RuntimePathsError {
    /// The configured PID file path was empty.
    #[error("pid file path must not be empty")]
    EmptyPidPath,
    /// The working directory could not be read to resolve a relative path.
    #[error("failed to resolve working directory: {source}")]
    WorkingDirectory {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Creating the directory holding the PID file failed.
    #[error("failed to prepare runtime directory '{path}': {source}")]
    RuntimeDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
