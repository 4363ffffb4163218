//! Configuration file for the `solvr` binary.
//!
//! ```toml
//! [store]
//! path = "solvr.db"
//! busy_timeout_ms = 5000
//!
//! [janitor]
//! warning_threshold_hours = 552
//! abandon_threshold_hours = 720
//!
//! [output]
//! color = true
//! format = "table"
//! ```
//!
//! Every table and every key is optional.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use solvr_janitor::JanitorConfig;
use solvr_store::StoreConfig;
use std::fs;
use std::path::Path;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "solvr.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolvrConfig {
    /// Database settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Stale-content thresholds and sweep schedule
    #[serde(default)]
    pub janitor: JanitorConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl SolvrConfig {
    /// Load configuration from an explicit path, or from
    /// [`DEFAULT_CONFIG_FILE`] if it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Read and validate a config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: SolvrConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the janitor thresholds and store settings.
    pub fn validate(&self) -> Result<()> {
        self.janitor.validate()?;
        if self.store.path.as_os_str().is_empty() {
            return Err(CliError::Config("store.path must not be empty".into()));
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
