//! Solvr Storage Layer
//!
//! SQLite implementation of every store trait in `solvr_domain::traits`.
//!
//! # Architecture
//!
//! - One connection behind a mutex; the store is `Send + Sync` and is shared
//!   through an `Arc` between request handlers and the sweep worker
//! - Multi-statement writes run in `IMMEDIATE` transactions, rolled back on
//!   drop if not committed
//! - All time windows are measured against an injectable [`Clock`]
//!
//! # Examples
//!
//! ```no_run
//! use solvr_store::SqliteStore;
//!
//! let store = SqliteStore::new("solvr.db").unwrap();
//! // Store is now ready for approach operations
//! ```

#![warn(missing_docs)]

mod approaches;
mod codec;
mod config;
mod error;
mod graph;
mod notifications;
mod stale;

pub use config::{StoreConfig, IN_MEMORY};
pub use error::StoreError;
pub use rusqlite::InterruptHandle;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use solvr_domain::{Clock, SystemClock};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use error::SqliteContext;

/// SQLite-based store for approaches, relationships, problems, and
/// notifications
///
/// # Thread Safety
///
/// The connection is guarded by a mutex, so concurrent callers are
/// serialized. This also serializes relationship creation, which together with
/// the unique indexes on "updates" edges rules out forks.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,
    clock: Arc<dyn Clock>,
}

impl SqliteStore {
    /// Open a store at the given database path with default settings
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use solvr_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("solvr.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let config = StoreConfig {
            path: path.as_ref().to_path_buf(),
            ..StoreConfig::default()
        };
        Self::open(&config)
    }

    /// Open a private in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(&StoreConfig::in_memory())
    }

    /// Open a store from configuration
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let opened = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.path)
        };
        let conn = opened.ctx("open", "database")?;

        conn.busy_timeout(config.busy_timeout()).ctx("open.busy_timeout", "database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;").ctx("open.pragmas", "database")?;
        if config.wal && !config.is_in_memory() {
            // journal_mode returns a row, so it cannot go through execute_batch
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
                .ctx("open.journal_mode", "database")?;
        }

        conn.execute_batch(include_str!("schema.sql")).ctx("initialize_schema", "database")?;

        tracing::debug!(path = %config.path.display(), "store opened");

        let interrupt = conn.get_interrupt_handle();
        Ok(Self {
            conn: Mutex::new(conn),
            interrupt,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for timestamps and time windows
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle that aborts whatever statement is running on this store
    ///
    /// The interrupted call fails with a transient [`StoreError`]; an open
    /// transaction is rolled back.
    pub fn interrupt_handle(&self) -> &InterruptHandle {
        &self.interrupt
    }

    /// Abort the statement currently running, if any
    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    /// Current time, truncated to the millisecond precision stored on disk
    pub fn now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }

    /// `now - window`, saturating at the earliest representable time
    pub(crate) fn cutoff(&self, window: std::time::Duration) -> Result<DateTime<Utc>, StoreError> {
        let window = chrono::Duration::from_std(window)
            .map_err(|_| StoreError::InvalidArgument(format!("window {:?} is too large", window)))?;
        Ok(self.now().checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}
