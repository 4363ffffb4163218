//! Solvr Janitor
//!
//! Background maintenance service for the stale-content lifecycle of problems
//! and approaches.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Warnings**: Telling authors their inactive approach is about to be abandoned
//! - **Abandonment**: Moving approaches idle in `working`/`starting` to `abandoned`
//! - **Dormancy**: Marking open problems that nobody attempted as `dormant`
//! - **Archival**: Snapshotting long-failed and superseded approaches, then
//!   marking them archived
//! - **Metrics collection**: Tracking each cycle for monitoring
//!
//! Every policy is a time window over `updated_at` (or `created_at` for
//! problems) and is idempotent, so sweeps can run on any schedule.
//!
//! ## Policies
//!
//! | Policy | Selects | Default window | Effect |
//! |--------|---------|----------------|--------|
//! | **Warn** | `working`/`starting` approaches | idle 23 to 30 days | one notification per inactivity window |
//! | **Abandon** | `working`/`starting` approaches | idle 30+ days | status `abandoned` |
//! | **Dormant** | open problems with no live approaches | created 60+ days ago | status `dormant` |
//! | **Archive** | `failed` / superseded approaches | idle 90 / 180+ days | JSON snapshot, `archived_at` set |
//!
//! Archival is a separate pass ([`Janitor::forget_stale_approaches`]) and is
//! not part of [`Janitor::sweep`].
//!
//! # Usage
//!
//! ## One-time Sweep
//!
//! ```no_run
//! use solvr_janitor::Janitor;
//! use solvr_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("solvr.db")?;
//! let mut janitor = Janitor::default_config();
//!
//! let report = janitor.sweep(&store, &store);
//! println!("{} warned, {} abandoned, {} dormant", report.warned, report.abandoned, report.dormant);
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use solvr_janitor::{JanitorConfig, JanitorWorker};
//! use solvr_store::SqliteStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(SqliteStore::new("solvr.db")?);
//!     let worker = JanitorWorker::new(JanitorConfig::default());
//!
//!     // Run indefinitely (until Ctrl+C)
//!     worker.run(store).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use solvr_janitor::JanitorConfig;
//!
//! // Default: warn at 23 days, abandon at 30, dormant at 60
//! let config = JanitorConfig::default();
//!
//! // Aggressive: a one-week abandonment window, hourly sweeps
//! let config = JanitorConfig::aggressive();
//!
//! // Lenient: a two-month abandonment window
//! let config = JanitorConfig::lenient();
//! ```
//!
//! # Configuration
//!
//! The Janitor can be configured via TOML:
//!
//! ```toml
//! [janitor]
//! warning_threshold_hours = 552
//! abandon_threshold_hours = 720
//! dormant_threshold_days = 60
//! failed_after_days = 90
//! superseded_after_days = 180
//! sweep_interval_minutes = 1440
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod cancel;
mod config;
mod error;
mod forgetting;
mod janitor;
mod metrics;
mod worker;

pub use cancel::CancellationToken;
pub use config::JanitorConfig;
pub use error::JanitorError;
pub use forgetting::{ApproachSnapshot, DirectorySnapshotSink, ForgettingReport, SnapshotSink};
pub use janitor::{abandonment_warning, Janitor, WarnOutcome};
pub use metrics::{JanitorMetrics, StepFailure, SweepReport, SweepStep};
pub use worker::{JanitorWorker, SweepTarget};
