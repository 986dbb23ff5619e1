//! CLI entry point for the image harvester.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};

mod app;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let (config, loaded_from) = app::config::load_config(args.config.as_deref())?;
    match &loaded_from {
        Some(path) => info!(config = %path.display(), "Loaded config file"),
        None => debug!("No config file found; using defaults"),
    }

    let show_progress = !args.quiet && io::stderr().is_terminal();
    let report = app::runtime::run_harvest(&config, show_progress).await?;

    if report.failed > 0 {
        warn!(failed = report.failed, "Some images could not be fetched");
    }
    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        total = report.total(),
        checkpoints = report.checkpoints,
        elapsed_ms = report.elapsed.as_millis(),
        manifest = %report.paths.manifest.display(),
        table = %report.paths.table.display(),
        "Harvest complete"
    );

    Ok(())
}
