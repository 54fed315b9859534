//! Termination signals sent to the recorded daemon.

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

/// Delivers the termination request to a recorded daemon.
pub trait ProcessSignaller {
    /// Sends `SIGTERM` to `pid`.
    ///
    /// `Errno::ESRCH` means the process no longer exists.
    fn terminate(&self, pid: u32) -> Result<(), Errno>;
}

/// Signaller using `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSignaller;

impl ProcessSignaller for SystemSignaller {
    fn terminate(&self, pid: u32) -> Result<(), Errno> {
        // A PID beyond the kernel's range cannot name a live process.
        let Ok(raw) = i32::try_from(pid) else {
            return Err(Errno::ESRCH);
        };
        kill(Pid::from_raw(raw), Signal::SIGTERM)
    }
}
