use clap::{Parser, Subcommand};

/// Command-line surface of the agent binary.
#[derive(Parser, Debug)]
#[command(
    name = "hostwatchd",
    version,
    about = "Host-metrics collection agent",
    disable_help_subcommand = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Lifecycle action to perform.
    #[command(subcommand)]
    pub(crate) action: DaemonAction,
}

/// Lifecycle actions understood by the agent.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DaemonAction {
    /// Detach into the background and start collecting.
    Start,
    /// Stop the recorded daemon, honouring the lock file.
    Stop,
    /// Stop any recorded daemon, then start a new one.
    Restart,
    /// Remove the lock file, then stop.
    Force,
    /// Report whether a daemon is recorded.
    Status,
    /// Collect in the foreground with the same PID file handling.
    Run,
}
