//! Cooperative cancellation for sweeps

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token wrapping an `AtomicBool`
///
/// Clones share the flag. The warn sweep checks it between approaches; the
/// worker sets it on shutdown.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token (not cancelled)
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Clear a previous request so the next sweep can run
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Relaxed);
    }
}
