//! Stale, archive and forget command implementations.

use super::parse_id;
use crate::cli::{ArchiveArgs, ForgetArgs, StaleArgs};
use crate::error::Result;
use crate::output::Formatter;
use solvr_domain::traits::StaleContentStore;
use solvr_domain::Approach;
use solvr_janitor::{DirectorySnapshotSink, ForgettingReport, Janitor, JanitorConfig};
use solvr_store::SqliteStore;

fn with_ages(args: &StaleArgs, base: &JanitorConfig) -> JanitorConfig {
    let mut config = base.clone();
    if let Some(days) = args.failed_after {
        config.failed_after_days = days;
    }
    if let Some(days) = args.superseded_after {
        config.superseded_after_days = days;
    }
    config
}

/// List approaches due for archival, with per-invocation age overrides.
pub fn stale_approaches(args: &StaleArgs, base: &JanitorConfig, store: &SqliteStore) -> Result<Vec<Approach>> {
    Ok(Janitor::new(with_ages(args, base)).stale_approaches(store)?)
}

/// Snapshot stale approaches into `args.dir` and mark them archived.
pub fn forget(args: &ForgetArgs, base: &JanitorConfig, store: &SqliteStore) -> Result<ForgettingReport> {
    let mut config = with_ages(&args.ages, base);
    config.dry_run |= args.dry_run;

    let sink = DirectorySnapshotSink::new(&args.dir);
    let report = Janitor::new(config).forget_stale_approaches(store, &sink)?;
    tracing::debug!(dir = %args.dir.display(), ?report, "forget pass finished");
    Ok(report)
}

/// Execute the stale command.
pub fn execute_stale(args: StaleArgs, base: &JanitorConfig, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let approaches = stale_approaches(&args, base, store)?;

    println!("{}", formatter.format_approaches(&approaches)?);

    Ok(())
}

/// Execute the archive command.
pub fn execute_archive(args: ArchiveArgs, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let id = parse_id(&args.id)?;
    store.archive_approach(id, &args.archive_ref)?;

    println!("{}", formatter.success(&format!("Approach {} archived to {}", id, args.archive_ref)));

    Ok(())
}

/// Execute the forget command.
pub fn execute_forget(args: ForgetArgs, base: &JanitorConfig, store: &SqliteStore, formatter: &Formatter) -> Result<()> {
    let report = forget(&args, base, store)?;

    println!("{}", formatter.format_forgetting(&report, args.dry_run || base.dry_run)?);

    Ok(())
}
