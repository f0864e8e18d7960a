// Headless entry point: every invocation is a replay run, there is no window.

use std::process::ExitCode;

use clap::Parser;
use paintkit::cli::{self, CliArgs};

fn main() -> ExitCode {
    cli::run(CliArgs::parse())
}
