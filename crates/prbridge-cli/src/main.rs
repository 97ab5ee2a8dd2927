mod bootstrap_helpers;
mod cli_args;
mod startup_dispatch;
mod startup_preflight;

use std::process::ExitCode;

use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;
use crate::startup_dispatch::run_cli;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run_cli(cli).await {
        Ok(outcome) => {
            tracing::info!(outcome = ?outcome, "bridge run finished");
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!(error = %format!("{error:#}"), "bridge run failed");
            ExitCode::FAILURE
        }
    }
}
