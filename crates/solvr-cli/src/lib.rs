//! Solvr CLI library.
//!
//! Operator surface for the approach store: runs the stale-content janitor,
//! lists and archives stale approaches, and prints version chains.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::{OutputFormat, SolvrConfig};
pub use error::{CliError, Result};
pub use output::Formatter;
