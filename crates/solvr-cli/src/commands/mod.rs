//! Command implementations.

pub mod chain;
pub mod config;
pub mod stale;
pub mod sweep;

pub use self::chain::{execute_chain, execute_latest};
pub use self::config::execute_config;
pub use self::stale::{execute_archive, execute_forget, execute_stale};
pub use self::sweep::{execute_run, execute_sweep};

use crate::error::Result;
use solvr_domain::ApproachId;
use solvr_store::SqliteStore;

/// Parse an approach ID given on the command line.
pub(crate) fn parse_id(raw: &str) -> Result<ApproachId> {
    Ok(SqliteStore::parse_approach_id(raw)?)
}
