//! Daemon process control.
//!
//! The controller turns the invoking process into a detached background
//! service, records it in a PID file, and drives the
//! start/stop/restart/force/status lifecycle from a separate invocation. State
//! lives in the filesystem so a controller started later can still find the
//! daemon.

use std::time::Duration;

mod controller;
pub(crate) mod daemonizer;
mod errors;
mod lockfile;
mod payload;
mod pidfile;
mod reporter;
pub(crate) mod shutdown;
mod signaller;

pub use controller::{
    DaemonController, DaemonStatus, LaunchMode, StartExclusivity, StopOutcome, StopPolicy,
};
pub use daemonizer::{DaemonizeError, Daemonizer, ForkStage, SystemDaemonizer};
pub use errors::DaemonError;
pub use lockfile::{BusyMarker, lock_present};
pub use payload::{Payload, PayloadError};
pub use pidfile::{PidFileState, read_pid_file};
pub use reporter::{DaemonPhase, LifecycleReporter, StructuredLifecycleReporter};
pub use shutdown::{ShutdownError, ShutdownFlag, ShutdownSource, SystemShutdownSource};
pub use signaller::{ProcessSignaller, SystemSignaller};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Delay between polls while `stop` waits on the lock file or the process.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);
