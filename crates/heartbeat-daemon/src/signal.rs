//! Signal handling for daemon processes.

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::DaemonError;
use crate::lifecycle::Lifecycle;

/// Signals that request a graceful stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
}

impl StopSignal {
    /// POSIX signal number.
    pub const fn number(&self) -> i32 {
        match self {
            StopSignal::Interrupt => 2,
            StopSignal::Terminate => 15,
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            StopSignal::Interrupt => SignalKind::interrupt(),
            StopSignal::Terminate => SignalKind::terminate(),
        }
    }
}

impl std::fmt::Display for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopSignal::Interrupt => write!(f, "SIGINT"),
            StopSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// Background tasks listening for stop signals. Dropping stops listening.
#[derive(Debug, Default)]
pub struct SignalListeners {
    handles: Vec<JoinHandle<()>>,
}

impl Drop for SignalListeners {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Hold SIGTERM and SIGINT pending on the calling thread.
///
/// Used across the double fork so a stop sent before [`install`] is kept until
/// the listeners exist instead of killing the process. The mask is inherited
/// by `fork` and by threads spawned afterwards.
#[cfg(unix)]
pub fn block_stop_signals() -> Result<(), DaemonError> {
    stop_signal_set()
        .thread_block()
        .map_err(|e| DaemonError::SignalSetup(format!("Failed to block stop signals: {}", e)))
}

/// Deliver SIGTERM and SIGINT again, including any held while blocked.
#[cfg(unix)]
pub fn unblock_stop_signals() -> Result<(), DaemonError> {
    stop_signal_set()
        .thread_unblock()
        .map_err(|e| DaemonError::SignalSetup(format!("Failed to unblock stop signals: {}", e)))
}

#[cfg(unix)]
fn stop_signal_set() -> nix::sys::signal::SigSet {
    use nix::sys::signal::{SigSet, Signal};

    let mut set = SigSet::empty();
    set.add(Signal::SIGTERM);
    set.add(Signal::SIGINT);
    set
}

#[cfg(not(unix))]
pub fn block_stop_signals() -> Result<(), DaemonError> {
    Ok(())
}

#[cfg(not(unix))]
pub fn unblock_stop_signals() -> Result<(), DaemonError> {
    Ok(())
}

/// Route SIGTERM and SIGINT into `lifecycle` (Unix only).
///
/// Must be called from inside a tokio runtime.
#[cfg(unix)]
pub fn install(lifecycle: &Lifecycle) -> Result<SignalListeners, DaemonError> {
    use tokio::signal::unix::signal;

    let mut listeners = SignalListeners::default();

    for stop_signal in [StopSignal::Terminate, StopSignal::Interrupt] {
        let mut stream =
            signal(stop_signal.kind()).map_err(|e| DaemonError::SignalSetup(e.to_string()))?;

        let lifecycle = lifecycle.clone();
        listeners.handles.push(tokio::spawn(async move {
            while stream.recv().await.is_some() {
                info!("Received {} ({})", stop_signal, stop_signal.number());
                if !lifecycle.request_stop() {
                    debug!("Stop already requested, ignoring {}", stop_signal);
                }
            }
        }));
    }

    info!("OS signal handlers installed (SIGTERM, SIGINT)");
    Ok(listeners)
}

/// Route Ctrl+C into `lifecycle` (non-Unix fallback).
#[cfg(not(unix))]
pub fn install(lifecycle: &Lifecycle) -> Result<SignalListeners, DaemonError> {
    let lifecycle = lifecycle.clone();

    // Only Ctrl+C is available on non-Unix
    let handle = tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received {}", StopSignal::Interrupt);
            lifecycle.request_stop();
        }
    });

    info!("OS signal handlers installed (Ctrl+C only)");
    Ok(SignalListeners {
        handles: vec![handle],
    })
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
