//! Work run inside the daemon once it has detached.

use std::error::Error;

use super::shutdown::ShutdownFlag;

/// Error type returned by daemon payloads.
pub type PayloadError = Box<dyn Error + Send + Sync + 'static>;

/// Behaviour run inside the daemon once it is detached and recorded.
///
/// The payload should return promptly after `shutdown` reports a request.
/// Returning ends the daemon; the PID file is removed afterwards.
pub trait Payload {
    /// Runs the daemon's work until completion or shutdown.
    fn run(&mut self, shutdown: &ShutdownFlag) -> Result<(), PayloadError>;
}

impl<F> Payload for F
where
    F: FnMut(&ShutdownFlag) -> Result<(), PayloadError>,
{
    fn run(&mut self, shutdown: &ShutdownFlag) -> Result<(), PayloadError> {
        self(shutdown)
    }
}
