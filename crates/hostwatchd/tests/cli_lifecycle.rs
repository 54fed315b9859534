//! Integration tests driving the `hostwatchd` binary through its lifecycle.
//!
//! The round trip forks a real daemon. The test process registers itself as
//! a child subreaper so the orphaned daemon is reparented here and can be
//! reaped once it exits; otherwise a container without an init process would
//! leave it as a zombie that still answers `kill`.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

fn command(runtime: &Path, action: &str) -> Command {
    let mut command = cargo_bin_cmd!("hostwatchd");
    command
        .env_remove("HOSTWATCH_CONFIG_PATH")
        .arg("--pid-file")
        .arg(runtime.join("hostwatchd.pid"))
        .arg("--log-file")
        .arg(runtime.join("hostwatchd.log"))
        .arg("--collection-interval-secs=1")
        .arg("--stop-poll-interval-ms=50")
        .arg("--stop-timeout-secs=10")
        .arg(action);
    command
}

fn wait_for_recorded_pid(pid_file: &Path) -> u32 {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    loop {
        if let Some(pid) = fs::read_to_string(pid_file)
            .ok()
            .and_then(|content| content.trim().parse().ok())
        {
            return pid;
        }
        assert!(
            Instant::now() < deadline,
            "daemon did not record its pid in {}",
            pid_file.display()
        );
        thread::sleep(POLL_INTERVAL);
    }
}

#[test]
fn status_reports_stopped_when_no_daemon_is_recorded() {
    let dir = TempDir::new().expect("temp dir");
    command(dir.path(), "status")
        .assert()
        .success()
        .stdout(contains("daemon is stopped"));
}

#[test]
fn stop_without_daemon_succeeds_with_a_warning() {
    let dir = TempDir::new().expect("temp dir");
    command(dir.path(), "stop")
        .assert()
        .success()
        .stderr(contains("daemon is not running"));
}

#[test]
fn start_refuses_when_pid_file_is_present() {
    let dir = TempDir::new().expect("temp dir");
    let pid_file = dir.path().join("hostwatchd.pid");
    fs::write(&pid_file, "4242\n").expect("seed pid file");
    command(dir.path(), "start")
        .assert()
        .failure()
        .stderr(contains("already running"));
    assert_eq!(fs::read_to_string(&pid_file).expect("pid file"), "4242\n");
    let log = fs::read_to_string(dir.path().join("hostwatchd.log")).expect("log file");
    assert!(
        log.contains("hostwatchd failed") && log.contains("already running"),
        "fatal errors must reach the log file: {log}"
    );
}

#[test]
fn missing_action_is_a_usage_error() {
    cargo_bin_cmd!("hostwatchd").assert().failure();
}

#[cfg(target_os = "linux")]
#[test]
fn start_status_stop_round_trip() {
    use nix::sys::prctl::set_child_subreaper;
    use nix::sys::wait::waitpid;
    use nix::unistd::Pid;

    set_child_subreaper(true).expect("become child subreaper");
    let dir = TempDir::new().expect("temp dir");
    let pid_file = dir.path().join("hostwatchd.pid");

    command(dir.path(), "start")
        .assert()
        .success()
        .stdout(contains("starting daemon"));
    let daemon_pid = wait_for_recorded_pid(&pid_file);
    let raw_pid = i32::try_from(daemon_pid).expect("pid fits in i32");
    let reaper = thread::spawn(move || waitpid(Pid::from_raw(raw_pid), None));

    command(dir.path(), "status")
        .assert()
        .success()
        .stdout(contains(format!("daemon is running (pid {daemon_pid})")));

    command(dir.path(), "stop")
        .assert()
        .success()
        .stdout(contains(format!("daemon pid {daemon_pid} stopped")));

    assert!(!pid_file.exists(), "stop must remove the pid file");
    reaper
        .join()
        .expect("reaper thread")
        .expect("daemon should be reaped");
    command(dir.path(), "status")
        .assert()
        .success()
        .stdout(contains("daemon is stopped"));
}
