//! Error surface of the daemon controller.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use hostwatch_config::RuntimePathsError;

use super::daemonizer::DaemonizeError;
use super::payload::PayloadError;
use super::shutdown::ShutdownError;

/// Errors surfaced while starting, stopping, or supervising the daemon.
///
/// Every variant that concerns a lifecycle file names it, so an operator can
/// inspect the artefact directly.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Runtime paths could not be resolved.
    #[error(transparent)]
    Paths(#[from] RuntimePathsError),
    /// The PID file already records a daemon.
    #[error("pid file '{path}' already exists (content: '{content}'); daemon already running?")]
    AlreadyRunning {
        /// PID file path.
        path: PathBuf,
        /// Trimmed file content found at start time.
        content: String,
    },
    /// Reading the PID file failed for a reason other than absence.
    #[error("failed to read pid file '{path}': {source}")]
    ReadPid {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The exclusive PID file claim could not be created.
    #[error("failed to claim pid file '{path}': {source}")]
    ClaimPid {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the PID file failed.
    #[error("failed to write pid file '{path}': {source}")]
    PidWrite {
        /// PID file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Removing a lifecycle file failed.
    #[error("failed to remove '{path}': {source}")]
    Cleanup {
        /// Path of the artefact that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Detaching from the terminal failed.
    #[error("{source} - pid file: {pid_file}")]
    Daemonize {
        /// PID file the daemon would have written.
        pid_file: PathBuf,
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// Delivering the termination signal failed with an unexpected error.
    #[error("failed to signal daemon pid {pid}: {source} - pid file: {pid_file}")]
    Signal {
        /// PID read from the PID file.
        pid: u32,
        /// PID file path.
        pid_file: PathBuf,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// The daemon did not exit within the configured stop bound.
    #[error("daemon pid {pid} did not exit within {timeout_ms} ms - pid file: {pid_file}")]
    StopTimeout {
        /// PID read from the PID file.
        pid: u32,
        /// PID file path.
        pid_file: PathBuf,
        /// Configured bound in milliseconds.
        timeout_ms: u128,
    },
    /// Installing the termination handlers failed.
    #[error("failed to install shutdown handlers: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// The injected payload returned an error.
    #[error("daemon payload failed: {source}")]
    Payload {
        /// Error returned by the payload.
        #[source]
        source: PayloadError,
    },
}

impl From<ShutdownError> for DaemonError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
