//! Maps lifecycle subcommands onto the daemon controller.

use std::fmt;
use std::io::{self, Write};
use std::process::ExitCode;

use hostwatch_config::{Config, RuntimePaths};

use crate::AppError;
use crate::agent::CollectionLoop;
use crate::cli::DaemonAction;
use crate::process::{DaemonController, LaunchMode, StopOutcome};
use crate::telemetry;

/// Borrowed output streams for lifecycle messages.
pub(crate) struct LifecycleOutput<W: Write, E: Write> {
    pub(crate) stdout: W,
    pub(crate) stderr: E,
}

impl<W: Write, E: Write> LifecycleOutput<W, E> {
    pub(crate) fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    pub(crate) fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stdout.write_fmt(args)?;
        self.stdout.write_all(b"\n")?;
        self.stdout.flush()
    }

    pub(crate) fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.stderr.write_fmt(args)?;
        self.stderr.write_all(b"\n")?;
        self.stderr.flush()
    }
}

/// Executes `action` against the configured runtime files.
pub(crate) fn execute<W, E>(
    action: DaemonAction,
    config: &Config,
    output: &mut LifecycleOutput<W, E>,
) -> Result<ExitCode, AppError>
where
    W: Write,
    E: Write,
{
    match action {
        DaemonAction::Status => {
            let paths = RuntimePaths::from_config_readonly(config)?;
            let status = DaemonController::new(paths).status();
            output.stdout_line(format_args!("{status}"))?;
        }
        DaemonAction::Start => {
            let controller = managed_controller(config)?;
            output.stdout_line(format_args!(
                "starting daemon (pid file {})",
                controller.paths().pid_path().display()
            ))?;
            controller.start(&mut payload(config, &controller))?;
        }
        DaemonAction::Run => {
            let controller = managed_controller(config)?.with_mode(LaunchMode::Foreground);
            controller.start(&mut payload(config, &controller))?;
        }
        DaemonAction::Restart => {
            let controller = managed_controller(config)?;
            output.stdout_line(format_args!(
                "restarting daemon (pid file {})",
                controller.paths().pid_path().display()
            ))?;
            controller.restart(&mut payload(config, &controller))?;
        }
        DaemonAction::Stop => {
            let controller = managed_controller(config)?;
            report_stop(controller.stop()?, &controller, output)?;
        }
        DaemonAction::Force => {
            let controller = managed_controller(config)?;
            report_stop(controller.force()?, &controller, output)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn managed_controller(config: &Config) -> Result<DaemonController, AppError> {
    telemetry::initialise(config)?;
    let paths = RuntimePaths::from_config(config)?;
    Ok(DaemonController::from_config(paths, config))
}

fn payload(config: &Config, controller: &DaemonController) -> CollectionLoop {
    CollectionLoop::system(config.collection_interval(), controller.paths().lock_path())
}

fn report_stop<W, E>(
    outcome: StopOutcome,
    controller: &DaemonController,
    output: &mut LifecycleOutput<W, E>,
) -> io::Result<()>
where
    W: Write,
    E: Write,
{
    match outcome {
        StopOutcome::Stopped { pid } => output.stdout_line(format_args!("daemon pid {pid} stopped")),
        StopOutcome::NotRunning => output.stderr_line(format_args!(
            "daemon is not running (pid file missing at {})",
            controller.paths().pid_path().display()
        )),
    }
}
