//! Error types for Janitor operations

use thiserror::Error;

/// Errors that can occur during Janitor operations
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Notification emitter error
    #[error("Notification error: {0}")]
    Notification(String),

    /// Snapshot could not be built or stored
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),

    /// The sweep was cancelled before it finished
    #[error("Sweep cancelled")]
    Cancelled,
}

impl JanitorError {
    pub(crate) fn store(err: impl std::fmt::Display) -> Self {
        JanitorError::Store(err.to_string())
    }

    pub(crate) fn notification(err: impl std::fmt::Display) -> Self {
        JanitorError::Notification(err.to_string())
    }

    pub(crate) fn snapshot(err: impl std::fmt::Display) -> Self {
        JanitorError::Snapshot(err.to_string())
    }
}
