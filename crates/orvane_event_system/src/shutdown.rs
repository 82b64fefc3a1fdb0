//! Shutdown coordination for graceful server shutdown.
//!
//! Shared shutdown state for coordinating graceful shutdown across server
//! components, ensuring in-flight work completes before final cleanup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared shutdown state for coordinating graceful shutdown across components.
#[derive(Debug, Clone)]
pub struct ShutdownState {
    /// Shutdown has been initiated - stop accepting new work.
    shutdown_initiated: Arc<AtomicBool>,
    /// Existing work has drained and final cleanup can begin.
    shutdown_complete: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Creates a new shutdown state with both flags cleared.
    pub fn new() -> Self {
        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_complete: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true once shutdown has been initiated.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    /// Returns true once shutdown is complete.
    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Initiates shutdown - accept loops and sweep tasks stop on observation.
    pub fn initiate_shutdown(&self) {
        self.shutdown_initiated.store(true, Ordering::Release);
        info!("🛑 Shutdown initiated - no new work will be accepted");
    }

    /// Marks shutdown as complete.
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        info!("✅ Shutdown drain complete - ready for final cleanup");
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}
