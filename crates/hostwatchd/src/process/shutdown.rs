//! Termination signal handling inside the daemon.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::flag;
use thiserror::Error;
use tracing::debug;

use super::PROCESS_TARGET;

const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Signals that request an orderly daemon shutdown.
pub(crate) const SHUTDOWN_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Shared flag raised when the daemon is asked to stop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    /// Builds a flag that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Raises the flag.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Sleeps for up to `duration`, waking early when shutdown is requested.
    ///
    /// Returns `true` when the flag was raised before the wait elapsed.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }

    fn shared(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Errors raised while installing the termination handlers.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering a handler for `signal` failed.
    #[error("failed to register handler for signal {signal}: {source}")]
    Install {
        /// Signal number.
        signal: i32,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Source of the shutdown flag handed to the payload.
pub trait ShutdownSource {
    /// Installs handlers and returns the flag they raise.
    fn install(&self) -> Result<ShutdownFlag, ShutdownError>;
}

/// Shutdown source backed by process signal handlers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSource;

impl SystemShutdownSource {
    /// Builds a new signal-backed source.
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSource for SystemShutdownSource {
    fn install(&self) -> Result<ShutdownFlag, ShutdownError> {
        let shutdown = ShutdownFlag::new();
        for signal in SHUTDOWN_SIGNALS {
            flag::register(signal, shutdown.shared())
                .map_err(|source| ShutdownError::Install { signal, source })?;
        }
        debug!(target: PROCESS_TARGET, "shutdown handlers installed");
        Ok(shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_returns_early_once_requested() {
        let shutdown = ShutdownFlag::new();
        let remote = shutdown.clone();
        let waker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.request();
        });
        let started = Instant::now();
        assert!(shutdown.wait_timeout(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
        waker.join().expect("waker thread");
    }

    #[test]
    fn wait_elapses_without_request() {
        let shutdown = ShutdownFlag::new();
        assert!(!shutdown.wait_timeout(Duration::from_millis(20)));
        assert!(!shutdown.is_requested());
    }
}
