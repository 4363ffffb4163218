//! Solvr CLI - Operator binary for approach versioning and stale content.

use anyhow::Context;
use clap::Parser;
use solvr_cli::commands;
use solvr_cli::{Cli, Command, Formatter, SolvrConfig};
use solvr_store::SqliteStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr, RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    let mut config = SolvrConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.database {
        config.store.path = path;
    }

    // Determine output format and color
    let format = cli.format.map(Into::into).unwrap_or(config.output.format);
    let color_enabled = !cli.no_color && config.output.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Config => commands::execute_config(&config, format)?,
        Command::Run(args) => commands::execute_run(args, &config.janitor, open_store(&config)?, &formatter).await?,
        Command::Sweep(args) => commands::execute_sweep(args, &config.janitor, open_store(&config)?, &formatter).await?,
        Command::Stale(args) => commands::execute_stale(args, &config.janitor, &*open_store(&config)?, &formatter)?,
        Command::Archive(args) => commands::execute_archive(args, &*open_store(&config)?, &formatter)?,
        Command::Forget(args) => commands::execute_forget(args, &config.janitor, &*open_store(&config)?, &formatter)?,
        Command::Chain(args) => commands::execute_chain(args, &*open_store(&config)?, &formatter)?,
        Command::Latest(args) => commands::execute_latest(args, &*open_store(&config)?, &formatter)?,
    }

    Ok(())
}

fn open_store(config: &SolvrConfig) -> anyhow::Result<Arc<SqliteStore>> {
    tracing::debug!(path = %config.store.path.display(), "opening store");
    let store = SqliteStore::open(&config.store)
        .with_context(|| format!("Failed to open database {}", config.store.path.display()))?;
    Ok(Arc::new(store))
}
