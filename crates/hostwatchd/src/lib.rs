//! Host-metrics agent with a built-in POSIX daemon controller.
//!
//! The [`process`] module turns the invoking process into a detached daemon
//! recorded in a PID file and controls it from later invocations through
//! `start`, `stop`, `restart`, `force`, and `status`. The [`agent`] module
//! provides the collection loop run inside the daemon. [`run`] ties both to
//! the command line.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tracing::error;

use hostwatch_config::{ConfigValidationError, RuntimePathsError};

pub mod agent;
mod cli;
mod config;
mod lifecycle;
pub mod process;
pub mod telemetry;

use cli::Cli;
use config::{ConfigLoader, OrthoConfigLoader, prepare_cli_arguments, split_config_arguments};
use lifecycle::LifecycleOutput;
use process::{DaemonError, PROCESS_TARGET};
use telemetry::TelemetryError;

#[cfg(test)]
mod tests;

/// Runs the agent CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);
    let cli_arguments = prepare_cli_arguments(&args, &split);
    let mut output = LifecycleOutput::new(&mut *stdout, &mut *stderr);

    let result = Cli::try_parse_from(cli_arguments)
        .map_err(AppError::CliUsage)
        .and_then(|cli| {
            let config = loader.load(&split.config_arguments)?;
            config.validate()?;
            Ok((cli, config))
        })
        .and_then(|(cli, config)| lifecycle::execute(cli.action, &config, &mut output));

    match result {
        Ok(exit_code) => exit_code,
        Err(AppError::CliUsage(error)) if !error.use_stderr() => {
            let _ = write!(output.stdout, "{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            // A detached daemon has lost stderr; the log file still records it.
            error!(target: PROCESS_TARGET, error = %error, "hostwatchd failed");
            let _ = output.stderr_line(format_args!("{error}"));
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigValidationError),
    #[error(transparent)]
    Paths(#[from] RuntimePathsError),
    #[error("failed to initialise telemetry: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Daemon(#[from] DaemonError),
    #[error("failed to write command output: {0}")]
    Output(#[from] io::Error),
}
