//! Test doubles and fixtures shared across the daemon test suites.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use tempfile::TempDir;

use hostwatch_config::RuntimePaths;

use crate::process::{
    DaemonController, DaemonPhase, DaemonizeError, Daemonizer, ForkStage, LifecycleReporter,
    ProcessSignaller, ShutdownError, ShutdownFlag, ShutdownSource, StopPolicy,
};

/// PID guaranteed to name no process: Linux caps `pid_max` well below it.
pub(crate) const VANISHED_PID: u32 = 99_999_999;

pub(crate) const FAST_POLL: Duration = Duration::from_millis(20);

pub(crate) type TestController = DaemonController<TestDaemonizer, RecordingSignaller, TestShutdownSource>;

/// Daemoniser that records calls instead of forking.
#[derive(Clone, Default)]
pub(crate) struct TestDaemonizer {
    calls: Arc<AtomicUsize>,
    failure: Option<ForkStage>,
}

impl TestDaemonizer {
    pub(crate) fn failing_at(stage: ForkStage) -> Self {
        Self {
            calls: Arc::default(),
            failure: Some(stage),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Daemonizer for TestDaemonizer {
    fn daemonize(&self) -> Result<(), DaemonizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(stage) => Err(DaemonizeError::Fork {
                stage,
                source: Errno::EAGAIN,
            }),
            None => Ok(()),
        }
    }
}

/// Shutdown source handing out a flag the test can raise.
#[derive(Clone, Default)]
pub(crate) struct TestShutdownSource {
    flag: ShutdownFlag,
}

impl TestShutdownSource {
    pub(crate) fn flag(&self) -> ShutdownFlag {
        self.flag.clone()
    }
}

impl ShutdownSource for TestShutdownSource {
    fn install(&self) -> Result<ShutdownFlag, ShutdownError> {
        Ok(self.flag.clone())
    }
}

/// Signaller replaying scripted results and recording when it was called.
///
/// Once the script is exhausted every call reports `ESRCH`.
#[derive(Clone, Default)]
pub(crate) struct RecordingSignaller {
    script: Arc<Mutex<VecDeque<Result<(), Errno>>>>,
    calls: Arc<Mutex<Vec<(u32, Instant)>>>,
}

impl RecordingSignaller {
    pub(crate) fn scripted(results: impl IntoIterator<Item = Result<(), Errno>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(results.into_iter().collect())),
            calls: Arc::default(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(u32, Instant)> {
        self.calls.lock().expect("signaller calls lock").clone()
    }
}

impl ProcessSignaller for RecordingSignaller {
    fn terminate(&self, pid: u32) -> Result<(), Errno> {
        self.calls
            .lock()
            .expect("signaller calls lock")
            .push((pid, Instant::now()));
        self.script
            .lock()
            .expect("signaller script lock")
            .pop_front()
            .unwrap_or(Err(Errno::ESRCH))
    }
}

/// Reporter capturing every phase transition.
#[derive(Default)]
pub(crate) struct RecordingReporter {
    phases: Mutex<Vec<DaemonPhase>>,
}

impl RecordingReporter {
    pub(crate) fn phases(&self) -> Vec<DaemonPhase> {
        self.phases.lock().expect("reporter lock").clone()
    }
}

impl LifecycleReporter for RecordingReporter {
    fn phase_changed(&self, phase: DaemonPhase, _pid_file: &Path) {
        self.phases.lock().expect("reporter lock").push(phase);
    }
}

/// Temporary directory holding the PID and lock files for one test.
pub(crate) struct TestRuntime {
    _dir: TempDir,
    pid_path: PathBuf,
    lock_path: PathBuf,
}

impl TestRuntime {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let pid_path = dir.path().join("hostwatchd.pid");
        let lock_path = dir.path().join("hostwatchd.lock");
        Self {
            _dir: dir,
            pid_path,
            lock_path,
        }
    }

    pub(crate) fn pid_path(&self) -> &Path {
        &self.pid_path
    }

    pub(crate) fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub(crate) fn paths(&self) -> RuntimePaths {
        RuntimePaths::new(&self.pid_path, Some(&self.lock_path)).expect("runtime paths")
    }

    pub(crate) fn paths_without_lock(&self) -> RuntimePaths {
        RuntimePaths::new(&self.pid_path, None).expect("runtime paths")
    }

    pub(crate) fn write_pid(&self, content: &str) {
        fs::write(&self.pid_path, content).expect("seed pid file");
    }

    pub(crate) fn write_lock(&self) {
        fs::write(&self.lock_path, "").expect("seed lock file");
    }

    pub(crate) fn read_pid(&self) -> Option<String> {
        fs::read_to_string(&self.pid_path).ok()
    }

    /// Controller wired to the given doubles, polling quickly.
    pub(crate) fn controller(
        &self,
        daemonizer: &TestDaemonizer,
        signaller: &RecordingSignaller,
        shutdown: &TestShutdownSource,
    ) -> TestController {
        DaemonController::new(self.paths())
            .with_stop_policy(StopPolicy::new(FAST_POLL, None))
            .with_collaborators(daemonizer.clone(), signaller.clone(), shutdown.clone())
    }
}
