//! Tests for the CLI runtime using an injected configuration loader.

use std::ffi::OsString;
use std::fs;
use std::process::ExitCode;

use rstest::{fixture, rstest};

use hostwatch_config::Config;

use crate::config::ConfigLoader;
use crate::tests::support::{TestRuntime, VANISHED_PID};
use crate::{AppError, run_with_loader};

struct StaticLoader {
    config: Config,
}

impl ConfigLoader for StaticLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

struct Invocation {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

#[fixture]
fn runtime() -> TestRuntime {
    TestRuntime::new()
}

fn loader_for(runtime: &TestRuntime) -> StaticLoader {
    StaticLoader {
        config: Config {
            pid_file: runtime.pid_path().to_path_buf(),
            lock_file: Some(runtime.lock_path().to_path_buf()),
            stop_poll_interval_ms: 10,
            ..Config::default()
        },
    }
}

fn invoke(loader: &StaticLoader, args: &[&str]) -> Invocation {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let arguments = std::iter::once("hostwatchd")
        .chain(args.iter().copied())
        .map(OsString::from);
    let exit = run_with_loader(arguments, &mut stdout, &mut stderr, loader);
    Invocation {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf-8"),
        stderr: String::from_utf8(stderr).expect("stderr utf-8"),
    }
}

#[rstest]
fn status_reports_stopped_without_pid_file(runtime: TestRuntime) {
    let result = invoke(&loader_for(&runtime), &["status"]);
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert_eq!(result.stdout, "daemon is stopped\n");
}

#[rstest]
fn status_reports_recorded_pid(runtime: TestRuntime) {
    runtime.write_pid("4242\n");
    let result = invoke(&loader_for(&runtime), &["status"]);
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert_eq!(result.stdout, "daemon is running (pid 4242)\n");
}

#[rstest]
fn stop_without_daemon_warns_and_succeeds(runtime: TestRuntime) {
    let result = invoke(&loader_for(&runtime), &["stop"]);
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert!(
        result.stderr.contains("daemon is not running"),
        "stderr: {}",
        result.stderr
    );
    assert!(result.stderr.contains(&runtime.pid_path().display().to_string()));
}

#[rstest]
fn force_clears_lock_and_stops_vanished_daemon(runtime: TestRuntime) {
    runtime.write_pid(&format!("{VANISHED_PID}\n"));
    runtime.write_lock();
    let result = invoke(&loader_for(&runtime), &["force"]);
    assert_eq!(result.exit, ExitCode::SUCCESS, "stderr: {}", result.stderr);
    assert_eq!(result.stdout, format!("daemon pid {VANISHED_PID} stopped\n"));
    assert!(!runtime.lock_path().exists());
    assert!(!runtime.pid_path().exists());
}

#[rstest]
fn start_refuses_over_recorded_pid(runtime: TestRuntime) {
    runtime.write_pid("4242\n");
    let result = invoke(&loader_for(&runtime), &["start"]);
    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(result.stderr.contains("already running"), "stderr: {}", result.stderr);
    assert_eq!(
        fs::read_to_string(runtime.pid_path()).expect("pid file"),
        "4242\n"
    );
}

#[rstest]
fn unknown_action_is_a_usage_error(runtime: TestRuntime) {
    let result = invoke(&loader_for(&runtime), &["reload"]);
    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(!result.stderr.is_empty());
}

#[rstest]
fn help_is_written_to_stdout(runtime: TestRuntime) {
    let result = invoke(&loader_for(&runtime), &["--help"]);
    assert_eq!(result.exit, ExitCode::SUCCESS);
    assert!(result.stdout.contains("status"), "stdout: {}", result.stdout);
}

#[rstest]
fn zero_collection_interval_is_rejected_before_any_action(runtime: TestRuntime) {
    let mut loader = loader_for(&runtime);
    loader.config.collection_interval_secs = 0;
    let result = invoke(&loader, &["start"]);
    assert_eq!(result.exit, ExitCode::FAILURE);
    assert!(
        result.stderr.contains("collection_interval_secs must be at least 1"),
        "stderr: {}",
        result.stderr
    );
    assert!(!runtime.pid_path().exists());
}
