//! Shared termination flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Lifecycle control shared between the signal listeners and the main loop.
///
/// Starts out running. [`Lifecycle::request_stop`] flips it exactly once and
/// cancels [`Lifecycle::token`]; it never flips back.
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    running: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl Lifecycle {
    /// Create a lifecycle in the running state.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            cancel: CancellationToken::new(),
        }
    }

    /// Whether no stop has been requested yet.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request shutdown. Returns `true` only for the call that flipped the flag.
    pub fn request_stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.cancel.cancel();
        was_running
    }

    /// Token cancelled on stop.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
