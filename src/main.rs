mod catalog;
mod cli;
mod config;
mod error;
mod launcher;
mod logging;
mod orchestrator;
mod pool;
mod producer;
mod report;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Command};
use config::GenConfig;
use console::style;

use crate::catalog::Job;
use crate::launcher::WorkerLauncher;
use crate::orchestrator::Orchestrator;
use crate::producer::ScadProducer;
use crate::report::RunSummary;
use crate::ui::PoolProgress;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").for_stderr().red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = GenConfig::load(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Worker { job }) => Ok(work(&job, &config)),
        None => {
            if let Some(jobs) = cli.jobs {
                config.max_concurrent = Some(jobs);
            }
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(drive(config, cli.config, cli.verbose))
        }
    }
}

/// Worker mode: one job, in this process, no further workers.
fn work(job: &Job, config: &GenConfig) -> ExitCode {
    let producer = ScadProducer::from_config(config);
    ExitCode::from(orchestrator::run_worker(job, &producer))
}

/// Driver mode: every catalog job through the worker pool.
async fn drive(
    config: GenConfig,
    config_path: Option<PathBuf>,
    verbose: bool,
) -> Result<ExitCode> {
    let started_at = Utc::now();
    let launcher = WorkerLauncher::current_exe()
        .context("failed to locate the capgen executable")?
        .with_config(config_path.as_deref())
        .with_verbose(verbose);
    let orchestrator = Orchestrator::new(config, launcher);

    let progress = PoolProgress::new();
    let report = orchestrator
        .drive(orchestrator.catalog(), &progress)
        .await?;
    progress.finish(&report);

    if orchestrator.config().write_report {
        let summary = RunSummary::new(started_at, &report);
        let path = summary.write_to(&orchestrator.config().target_dir)?;
        println!("  Report written to {}", path.display());
    }

    Ok(ExitCode::from(report.exit_status()))
}
