//! Configuration for the SQLite store

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Path used for in-memory databases
pub const IN_MEMORY: &str = ":memory:";

/// Store configuration, usually the `[store]` table of the config file
///
/// ```toml
/// [store]
/// path = "solvr.db"
/// busy_timeout_ms = 5000
/// wal = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file, or `:memory:`
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long a statement waits on a locked database before failing
    /// with a transient error
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Use write-ahead logging (ignored for in-memory databases)
    #[serde(default = "default_wal")]
    pub wal: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from("solvr.db")
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_wal() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: default_wal(),
        }
    }
}

impl StoreConfig {
    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(IN_MEMORY),
            ..Self::default()
        }
    }

    /// Whether this points at an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    /// Busy timeout as a Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
