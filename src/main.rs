mod cli;
mod config;
mod error;
mod inventory;
mod orchestrator;
mod pool;
mod scoring;
mod ui;
mod upload;
mod worker;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::{CriticalityConfig, Credentials};
use error::CriticalityError;
use inventory::JupiterOneClient;
use orchestrator::{CriticalityRun, RunOutcome};
use ui::{LogWriter, RunProgress};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let progress = RunProgress::new();
    init_tracing(cli.verbose, progress.log_writer());

    match run(cli, progress).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool, writer: LogWriter) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();
}

async fn run(cli: Cli, progress: RunProgress) -> anyhow::Result<ExitCode> {
    info!("begin acquiring criticality data");

    // Missing credentials or an unusable client end the process with status 1.
    let credentials = Credentials::from_env()?;
    let client = JupiterOneClient::new(&credentials).map_err(CriticalityError::from)?;

    let mut config = CriticalityConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli.assets, cli.age_weight, cli.dependency_weight);

    progress.start(&config.assets);
    let run = CriticalityRun::new(Arc::new(client), config).with_dry_run(cli.dry_run);

    match run.execute().await {
        Ok(outcome) => {
            progress.complete(&outcome);
            if let RunOutcome::DryRun { records } | RunOutcome::Uploaded { records, .. } = &outcome
            {
                ui::write_report(&mut std::io::stdout().lock(), records, cli.json)?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_validation() => {
            progress.fail(&e);
            info!("exiting");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            progress.fail(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}
