use clap::Parser;
use dirsort::cli::{Cli, run_cli};
use dirsort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
