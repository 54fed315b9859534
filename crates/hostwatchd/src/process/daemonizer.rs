//! Double-fork daemonisation backend.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::process;

use nix::errno::Errno;
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, chdir, dup2, fork, setsid};
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

const NULL_DEVICE: &str = "/dev/null";

/// Abstraction over daemonisation strategies.
pub trait Daemonizer {
    /// Detaches the process into the background.
    ///
    /// Returns only in the final, detached process; intermediate parents exit.
    fn daemonize(&self) -> Result<(), DaemonizeError>;
}

/// Identifies which of the two forks failed.
///
/// The distinction matters to the caller: a first-fork failure happens in the
/// original foreground process, a second-fork failure in the already-detached
/// session leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkStage {
    /// Fork that lets the invoking process return to its shell.
    First,
    /// Fork that drops session leadership.
    Second,
}

impl fmt::Display for ForkStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => formatter.write_str("fork #1"),
            Self::Second => formatter.write_str("fork #2"),
        }
    }
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// `fork(2)` failed.
    #[error("daemon {stage} failed: {source}")]
    Fork {
        /// Which fork failed.
        stage: ForkStage,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// `setsid(2)` failed.
    #[error("failed to create a new session: {source}")]
    Setsid {
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// Moving to the filesystem root failed.
    #[error("failed to change directory to '/': {source}")]
    ChangeDirectory {
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// Pointing the standard streams at the null device failed.
    #[error("failed to redirect standard streams to {NULL_DEVICE}: {source}")]
    RedirectStreams {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Daemoniser performing the classic POSIX double fork.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDaemonizer;

impl SystemDaemonizer {
    /// Builds a new system daemoniser.
    pub fn new() -> Self {
        Self
    }
}

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self) -> Result<(), DaemonizeError> {
        info!(target: PROCESS_TARGET, "daemonising into background");
        fork_and_exit_parent(ForkStage::First)?;

        chdir("/").map_err(|source| DaemonizeError::ChangeDirectory { source })?;
        setsid().map_err(|source| DaemonizeError::Setsid { source })?;
        umask(Mode::empty());

        fork_and_exit_parent(ForkStage::Second)?;
        redirect_standard_streams()?;
        info!(
            target: PROCESS_TARGET,
            pid = process::id(),
            "daemon process detached; continuing in grandchild"
        );
        Ok(())
    }
}

fn fork_and_exit_parent(stage: ForkStage) -> Result<(), DaemonizeError> {
    // SAFETY: the controller forks before starting any threads of its own, so
    // the child inherits a single-threaded address space and may keep using
    // the allocator and std.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => process::exit(0),
        Ok(ForkResult::Child) => Ok(()),
        Err(source) => Err(DaemonizeError::Fork { stage, source }),
    }
}

fn redirect_standard_streams() -> Result<(), DaemonizeError> {
    io::stdout()
        .flush()
        .and_then(|()| io::stderr().flush())
        .map_err(|source| DaemonizeError::RedirectStreams { source })?;
    let null = OpenOptions::new()
        .read(true)
        .append(true)
        .open(NULL_DEVICE)
        .map_err(|source| DaemonizeError::RedirectStreams { source })?;
    for target in [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO] {
        dup2(null.as_raw_fd(), target).map_err(|errno| DaemonizeError::RedirectStreams {
            source: io::Error::from(errno),
        })?;
    }
    Ok(())
}
