use clap::Parser;
use std::process::ExitCode;
use symsort::cli::{Cli, run_cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    run_cli(&cli)
}
