//! Lifecycle controller: start, stop, restart, force, and status.

use std::fmt;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use tracing::{debug, info, warn};

use hostwatch_config::{Config, RuntimePaths};

use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::DaemonError;
use super::lockfile::lock_present;
use super::payload::Payload;
use super::pidfile::{self, PidFileGuard, PidFileState};
use super::reporter::{DaemonPhase, LifecycleReporter, StructuredLifecycleReporter};
use super::shutdown::{ShutdownSource, SystemShutdownSource};
use super::signaller::{ProcessSignaller, SystemSignaller};
use super::{DEFAULT_POLL_INTERVAL, PROCESS_TARGET};

/// Chooses whether `start` detaches from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode {
    /// Double fork into the background.
    #[default]
    Background,
    /// Stay attached; PID file handling is unchanged.
    Foreground,
}

/// How `start` guards against a second instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartExclusivity {
    /// Check for a non-empty PID file, then overwrite it after forking.
    #[default]
    Advisory,
    /// Create the PID file atomically before forking.
    Exclusive,
}

impl StartExclusivity {
    fn from_flag(exclusive: bool) -> Self {
        if exclusive {
            Self::Exclusive
        } else {
            Self::Advisory
        }
    }
}

/// Polling behaviour of `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    poll_interval: Duration,
    timeout: Option<Duration>,
}

impl StopPolicy {
    /// Builds a policy polling every `poll_interval`, optionally bounded.
    pub const fn new(poll_interval: Duration, timeout: Option<Duration>) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    /// Delay between lock checks and signal attempts.
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Upper bound on the whole stop, if any.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, None)
    }
}

/// Result of a successful `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// No daemon was recorded; nothing was signalled.
    NotRunning,
    /// The recorded daemon exited and its files were removed.
    Stopped {
        /// PID that was terminated.
        pid: u32,
    },
}

/// Answer to `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonStatus {
    /// A PID file exists.
    Running {
        /// Recorded PID when the file holds one.
        pid: Option<u32>,
    },
    /// No PID file exists.
    Stopped,
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running { pid: Some(pid) } => write!(formatter, "daemon is running (pid {pid})"),
            Self::Running { pid: None } => formatter.write_str("daemon is running (pid unknown)"),
            Self::Stopped => formatter.write_str("daemon is stopped"),
        }
    }
}

/// Drives the daemon lifecycle against a pair of runtime files.
///
/// The daemoniser, signaller, and shutdown source are injected so tests can
/// exercise every transition without forking or signalling real processes.
pub struct DaemonController<D = SystemDaemonizer, K = SystemSignaller, S = SystemShutdownSource>
{
    paths: RuntimePaths,
    mode: LaunchMode,
    exclusivity: StartExclusivity,
    stop_policy: StopPolicy,
    daemonizer: D,
    signaller: K,
    shutdown: S,
    reporter: Arc<dyn LifecycleReporter>,
}

impl DaemonController {
    /// Builds a controller using the system collaborators.
    pub fn new(paths: RuntimePaths) -> Self {
        Self {
            paths,
            mode: LaunchMode::default(),
            exclusivity: StartExclusivity::default(),
            stop_policy: StopPolicy::default(),
            daemonizer: SystemDaemonizer::new(),
            signaller: SystemSignaller,
            shutdown: SystemShutdownSource::new(),
            reporter: Arc::new(StructuredLifecycleReporter::new()),
        }
    }

    /// Builds a controller from resolved runtime paths and configuration.
    pub fn from_config(paths: RuntimePaths, config: &Config) -> Self {
        Self::new(paths)
            .with_exclusivity(StartExclusivity::from_flag(config.exclusive_start()))
            .with_stop_policy(StopPolicy::new(
                config.stop_poll_interval(),
                config.stop_timeout(),
            ))
    }
}

impl<D, K, S> DaemonController<D, K, S> {
    /// Overrides the launch mode.
    #[must_use]
    pub fn with_mode(mut self, mode: LaunchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Overrides the start exclusivity.
    #[must_use]
    pub fn with_exclusivity(mut self, exclusivity: StartExclusivity) -> Self {
        self.exclusivity = exclusivity;
        self
    }

    /// Overrides the stop polling behaviour.
    #[must_use]
    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    /// Overrides the phase observer.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn LifecycleReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Swaps the process collaborators.
    pub fn with_collaborators<D2, K2, S2>(
        self,
        daemonizer: D2,
        signaller: K2,
        shutdown: S2,
    ) -> DaemonController<D2, K2, S2> {
        DaemonController {
            paths: self.paths,
            mode: self.mode,
            exclusivity: self.exclusivity,
            stop_policy: self.stop_policy,
            daemonizer,
            signaller,
            shutdown,
            reporter: self.reporter,
        }
    }

    /// Runtime files managed by this controller.
    pub fn paths(&self) -> &RuntimePaths {
        &self.paths
    }

    /// Reports whether a daemon is recorded.
    ///
    /// Only the PID file's existence is consulted; the recorded process is
    /// not signalled.
    pub fn status(&self) -> DaemonStatus {
        match pidfile::read_pid_file(self.paths.pid_path()) {
            Ok(PidFileState::Missing) => DaemonStatus::Stopped,
            Ok(state) => DaemonStatus::Running { pid: state.pid() },
            Err(error) => {
                debug!(target: PROCESS_TARGET, error = %error, "pid file exists but is unreadable");
                DaemonStatus::Running { pid: None }
            }
        }
    }

    fn report(&self, phase: DaemonPhase) {
        self.reporter.phase_changed(phase, self.paths.pid_path());
    }
}

impl<D, K, S> DaemonController<D, K, S>
where
    D: Daemonizer,
    K: ProcessSignaller,
    S: ShutdownSource,
{
    /// Starts the daemon and runs `payload` inside it.
    ///
    /// In background mode this returns only in the detached grandchild, once
    /// the payload finishes; the invoking process exits during the first fork.
    pub fn start<P>(&self, payload: &mut P) -> Result<(), DaemonError>
    where
        P: Payload + ?Sized,
    {
        let pid_path = self.paths.pid_path();
        let claimed = match self.exclusivity {
            StartExclusivity::Exclusive => Some(pidfile::claim(pid_path)?),
            StartExclusivity::Advisory => {
                pidfile::ensure_vacant(pid_path)?;
                None
            }
        };

        if self.mode == LaunchMode::Background {
            self.report(DaemonPhase::Daemonizing);
            self.daemonizer
                .daemonize()
                .map_err(|source| DaemonError::Daemonize {
                    pid_file: pid_path.to_path_buf(),
                    source,
                })?;
        }

        let guard = claimed.unwrap_or_else(|| PidFileGuard::new(pid_path));
        let shutdown = self.shutdown.install()?;
        let pid = process::id();
        guard.write(pid)?;
        self.report(DaemonPhase::Running);
        info!(
            target: PROCESS_TARGET,
            pid,
            pid_file = %pid_path.display(),
            "daemon started"
        );

        let outcome = payload.run(&shutdown);
        self.report(DaemonPhase::Stopping);
        drop(guard);
        self.report(DaemonPhase::Stopped);
        match &outcome {
            Ok(()) => info!(target: PROCESS_TARGET, pid, "daemon exited"),
            Err(error) => warn!(target: PROCESS_TARGET, pid, error = %error, "daemon payload failed"),
        }
        outcome.map_err(|source| DaemonError::Payload { source })
    }

    /// Terminates the recorded daemon and removes its files.
    ///
    /// Succeeds without signalling when no daemon is recorded. While the lock
    /// file exists the signal is deferred; afterwards `SIGTERM` is repeated
    /// until the process disappears.
    pub fn stop(&self) -> Result<StopOutcome, DaemonError> {
        let pid_path = self.paths.pid_path();
        let recorded = match pidfile::read_pid_file(pid_path) {
            Ok(state) => state.pid(),
            Err(error) => {
                warn!(target: PROCESS_TARGET, error = %error, "pid file unreadable");
                None
            }
        };
        let Some(pid) = recorded else {
            warn!(
                target: PROCESS_TARGET,
                pid_file = %pid_path.display(),
                "pid file does not exist; daemon not running?"
            );
            return Ok(StopOutcome::NotRunning);
        };

        self.report(DaemonPhase::Stopping);
        info!(target: PROCESS_TARGET, pid, "stopping daemon");
        self.terminate_until_gone(pid)?;

        pidfile::remove_file(pid_path)?;
        if let Some(lock_path) = self.paths.lock_path() {
            pidfile::remove_file(lock_path)?;
        }
        self.report(DaemonPhase::Stopped);
        info!(target: PROCESS_TARGET, pid, "daemon stopped");
        Ok(StopOutcome::Stopped { pid })
    }

    /// Forgets any busy marker, then stops.
    pub fn force(&self) -> Result<StopOutcome, DaemonError> {
        if let Some(lock_path) = self.paths.lock_path() {
            if lock_present(lock_path) {
                info!(
                    target: PROCESS_TARGET,
                    lock_file = %lock_path.display(),
                    "removing lock file before stopping"
                );
            }
            pidfile::remove_file(lock_path)?;
        }
        self.stop()
    }

    /// Stops any recorded daemon, then starts a new one.
    pub fn restart<P>(&self, payload: &mut P) -> Result<(), DaemonError>
    where
        P: Payload + ?Sized,
    {
        self.stop()?;
        self.start(payload)
    }

    fn terminate_until_gone(&self, pid: u32) -> Result<(), DaemonError> {
        let poll = self.stop_policy.poll_interval();
        let deadline = self.stop_policy.timeout().map(|bound| Instant::now() + bound);
        loop {
            if let Some(lock_path) = self.paths.lock_path() {
                thread::sleep(poll);
                if lock_present(lock_path) {
                    debug!(
                        target: PROCESS_TARGET,
                        pid,
                        lock_file = %lock_path.display(),
                        "lock file present; deferring termination"
                    );
                    self.check_deadline(deadline, pid)?;
                    continue;
                }
            }
            match self.signaller.terminate(pid) {
                Ok(()) => {}
                Err(Errno::ESRCH) => return Ok(()),
                Err(source) => {
                    return Err(DaemonError::Signal {
                        pid,
                        pid_file: self.paths.pid_path().to_path_buf(),
                        source,
                    });
                }
            }
            thread::sleep(poll);
            self.check_deadline(deadline, pid)?;
        }
    }

    fn check_deadline(&self, deadline: Option<Instant>, pid: u32) -> Result<(), DaemonError> {
        match (deadline, self.stop_policy.timeout()) {
            (Some(deadline), Some(bound)) if Instant::now() >= deadline => {
                Err(DaemonError::StopTimeout {
                    pid,
                    pid_file: self.paths.pid_path().to_path_buf(),
                    timeout_ms: bound.as_millis(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl<D, K, S> fmt::Debug for DaemonController<D, K, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DaemonController")
            .field("paths", &self.paths)
            .field("mode", &self.mode)
            .field("exclusivity", &self.exclusivity)
            .field("stop_policy", &self.stop_policy)
            .finish_non_exhaustive()
    }
}
