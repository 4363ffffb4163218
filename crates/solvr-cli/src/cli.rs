//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solvr - Maintain approach version chains and stale content.
#[derive(Debug, Parser)]
#[command(name = "solvr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SOLVR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database path, overriding the config file
    #[arg(short, long, global = true, env = "SOLVR_DB")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs and counts only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the stale-content sweep on a schedule until Ctrl+C
    Run(RunArgs),

    /// Run a single sweep and print the report
    Sweep(SweepArgs),

    /// List failed and superseded approaches due for archival
    Stale(StaleArgs),

    /// Mark an approach archived
    Archive(ArchiveArgs),

    /// Snapshot every stale approach to a directory and mark it archived
    Forget(ForgetArgs),

    /// Show the version chain of an approach
    Chain(ChainArgs),

    /// Show the latest version in an approach's lineage
    Latest(LatestArgs),

    /// Print the effective configuration
    Config,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Threshold preset (default, aggressive, lenient) replacing the config file's
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Minutes between sweeps
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Count candidates without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the sweep command.
#[derive(Debug, Parser)]
pub struct SweepArgs {
    /// Threshold preset (default, aggressive, lenient) replacing the config file's
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Count candidates without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the stale command.
#[derive(Debug, Parser)]
pub struct StaleArgs {
    /// Days a failed approach must be idle
    #[arg(long)]
    pub failed_after: Option<u32>,

    /// Days a superseded approach must be idle
    #[arg(long)]
    pub superseded_after: Option<u32>,
}

/// Arguments for the archive command.
#[derive(Debug, Parser)]
pub struct ArchiveArgs {
    /// Approach ID
    pub id: String,

    /// Where the archived snapshot is stored
    #[arg(short = 'r', long = "ref")]
    pub archive_ref: String,
}

/// Arguments for the forget command.
#[derive(Debug, Parser)]
pub struct ForgetArgs {
    /// Directory that receives one JSON snapshot per archived approach
    #[arg(long)]
    pub dir: PathBuf,

    /// Age limits for the stale listing
    #[command(flatten)]
    pub ages: StaleArgs,

    /// Count stale approaches without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the chain command.
#[derive(Debug, Parser)]
pub struct ChainArgs {
    /// Approach ID
    pub id: String,

    /// Maximum number of predecessors (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub depth: usize,
}

/// Arguments for the latest command.
#[derive(Debug, Parser)]
pub struct LatestArgs {
    /// Any approach ID in the lineage
    pub id: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
