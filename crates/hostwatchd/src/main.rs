//! CLI entrypoint for the hostwatch agent.
//!
//! The binary delegates to [`hostwatchd::run`], which loads configuration,
//! parses the lifecycle subcommand, and drives the daemon controller.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    hostwatchd::run(std::env::args_os(), &mut stdout, &mut stderr)
}
