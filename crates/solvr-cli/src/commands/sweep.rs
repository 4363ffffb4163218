//! Run and sweep command implementations.

use crate::cli::{RunArgs, SweepArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use solvr_janitor::{JanitorConfig, JanitorWorker, SweepReport};
use solvr_store::SqliteStore;
use std::sync::Arc;

/// Apply command-line overrides to the configured thresholds.
///
/// A preset replaces the configured thresholds entirely; `--dry-run` can
/// only turn dry-run mode on.
pub fn janitor_config(base: &JanitorConfig, preset: Option<&str>, dry_run: bool) -> Result<JanitorConfig> {
    let mut config = match preset {
        Some(name) => JanitorConfig::preset(name).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Unknown preset '{}' (expected default, aggressive or lenient)",
                name
            ))
        })?,
        None => base.clone(),
    };
    config.dry_run |= dry_run;
    config.validate()?;
    Ok(config)
}

/// Run one sweep against the store.
pub async fn sweep(config: JanitorConfig, store: &Arc<SqliteStore>) -> Result<SweepReport> {
    let worker = JanitorWorker::new(config);
    let report = worker.sweep_once(store).await?;
    tracing::debug!(
        warned = report.warned,
        abandoned = report.abandoned,
        dormant = report.dormant,
        failures = report.failures.len(),
        "sweep finished"
    );
    Ok(report)
}

/// Execute the sweep command.
pub async fn execute_sweep(
    args: SweepArgs,
    base: &JanitorConfig,
    store: Arc<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let config = janitor_config(base, args.preset.as_deref(), args.dry_run)?;
    let report = sweep(config, &store).await?;

    println!("{}", formatter.format_report(&report)?);

    Ok(())
}

/// Execute the run command.
pub async fn execute_run(
    args: RunArgs,
    base: &JanitorConfig,
    store: Arc<SqliteStore>,
    formatter: &Formatter,
) -> Result<()> {
    let mut config = janitor_config(base, args.preset.as_deref(), args.dry_run)?;
    if let Some(minutes) = args.interval {
        if minutes == 0 {
            return Err(CliError::InvalidInput("Interval must be at least one minute".to_string()));
        }
        config.sweep_interval_minutes = minutes;
    }

    eprintln!(
        "{}",
        formatter.info(&format!(
            "Janitor running every {} minute(s){}. Press Ctrl+C to stop.",
            config.sweep_interval_minutes,
            if config.dry_run { " in dry-run mode" } else { "" }
        ))
    );

    let worker = JanitorWorker::new(config);
    worker.run(store).await?;

    let metrics = worker.metrics();
    eprintln!("{}", formatter.success(&format!("Janitor stopped after {} sweep(s)", metrics.sweep_count)));
    println!("{}", metrics.summary());

    Ok(())
}
