//! Error types for storage operations

use rusqlite::ErrorCode;
use solvr_domain::ApproachStatus;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Approach, problem, or relationship target absent or soft-deleted
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity looked up
        entity: &'static str,
        /// Identifier that was not found
        id: String,
    },

    /// Malformed identifier supplied by a caller
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Duplicate relationship, fork, or cycle in the version graph
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Status change the lifecycle does not allow
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: ApproachStatus,
        /// Requested status
        to: ApproachStatus,
    },

    /// Caller passed arguments that can never be satisfied
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Busy, locked, or interrupted connection; safe to retry
    #[error("Transient error in {op} on {table}: {source}")]
    Transient {
        /// Operation name
        op: &'static str,
        /// Table involved
        table: &'static str,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// Any other database error
    #[error("Database error in {op} on {table}: {source}")]
    Database {
        /// Operation name
        op: &'static str,
        /// Table involved
        table: &'static str,
        /// Underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// Stored data could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Connection mutex was poisoned by a panicking holder
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }

    /// Whether the error means the target does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound { entity, id: id.to_string() }
    }

    /// Classify a rusqlite error, attaching the operation and table
    pub(crate) fn from_sqlite(op: &'static str, table: &'static str, source: rusqlite::Error) -> Self {
        let code = match &source {
            rusqlite::Error::SqliteFailure(e, _) => Some(e.code),
            _ => None,
        };
        match code {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::OperationInterrupted) => {
                StoreError::Transient { op, table, source }
            }
            Some(ErrorCode::ConstraintViolation) => {
                StoreError::IntegrityViolation(format!("{} on {}: {}", op, table, source))
            }
            _ => StoreError::Database { op, table, source },
        }
    }
}

/// Attach operation context to rusqlite results
pub(crate) trait SqliteContext<T> {
    fn ctx(self, op: &'static str, table: &'static str) -> Result<T, StoreError>;
}

impl<T> SqliteContext<T> for Result<T, rusqlite::Error> {
    fn ctx(self, op: &'static str, table: &'static str) -> Result<T, StoreError> {
        self.map_err(|e| {
            let err = StoreError::from_sqlite(op, table, e);
            tracing::debug!(op, table, error = %err, "query failed");
            err
        })
    }
}
