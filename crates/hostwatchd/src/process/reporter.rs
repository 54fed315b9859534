//! Lifecycle phase reporting.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::PROCESS_TARGET;

/// Externally visible phase of a daemon managed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonPhase {
    /// No daemon process is recorded.
    Stopped,
    /// The process is detaching from its terminal.
    Daemonizing,
    /// The PID file is written and the payload is running.
    Running,
    /// Termination is in progress.
    Stopping,
}

impl DaemonPhase {
    /// Stable lowercase label used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Daemonizing => "daemonizing",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for DaemonPhase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Observer notified on every phase transition.
pub trait LifecycleReporter: Send + Sync {
    /// Called when the daemon enters `phase`.
    fn phase_changed(&self, phase: DaemonPhase, pid_file: &Path);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter + ?Sized,
{
    fn phase_changed(&self, phase: DaemonPhase, pid_file: &Path) {
        self.as_ref().phase_changed(phase, pid_file);
    }
}

/// Reporter emitting one structured `tracing` event per transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new structured reporter.
    pub fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn phase_changed(&self, phase: DaemonPhase, pid_file: &Path) {
        info!(
            target: PROCESS_TARGET,
            event = "phase",
            phase = phase.as_str(),
            pid_file = %pid_file.display(),
            "daemon phase changed"
        );
    }
}
