//! CLI entrypoint for the API migration comparison tool

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use apidiff::{load_endpoints, Comparator};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Compare API responses between a server and its migrated replacement
#[derive(Debug, Parser)]
#[command(name = "apidiff")]
#[command(about = "Compare HTTP responses between an Express server and its Fastify replacement")]
struct Cli {
    /// Base URL of the reference (pre-migration) server
    #[arg(long, value_name = "URL")]
    express: String,

    /// Base URL of the candidate (migrated) server
    #[arg(long, value_name = "URL")]
    fastify: String,

    /// JSON file with the ordered list of endpoints to replay
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Print per-endpoint progress
    #[arg(long, short)]
    verbose: bool,

    /// Output file for the machine-readable report
    #[arg(long, value_name = "FILE", default_value = "migration_report.json")]
    report: PathBuf,
}

// Current-thread runtime: the harness is strictly sequential, one request
// in flight at a time.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    // Config errors are fatal here, before any comparison runs
    let endpoints = load_endpoints(&cli.config)?;
    debug!("loaded {} endpoints from {}", endpoints.len(), cli.config.display());

    let comparator = Comparator::new(&cli.express, &cli.fastify, cli.verbose)?;
    let report = comparator.run_test_suite(&endpoints).await;

    // The report is exported regardless of overall success
    report.export_report(&cli.report)?;

    Ok(if report.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
