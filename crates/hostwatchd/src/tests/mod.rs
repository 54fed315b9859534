//! Test suites for the hostwatch daemon controller and CLI.

mod cli;
mod support;
