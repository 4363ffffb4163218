//! Config command implementation.

use crate::config::{OutputFormat, SolvrConfig};
use crate::error::Result;

/// Print the effective configuration, after file and flag overrides.
pub fn execute_config(config: &SolvrConfig, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Table | OutputFormat::Quiet => config.to_toml()?,
    };

    println!("{}", rendered);

    Ok(())
}
