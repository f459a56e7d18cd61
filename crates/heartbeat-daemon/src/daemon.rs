//! Core daemon process management.

use std::sync::atomic::{AtomicU8, Ordering};

use heartbeat_config::{Config, ConfigValidator, DaemonConfig};
use tracing::{debug, info, warn};

use crate::detach::Detach;
use crate::error::{DaemonError, DaemonState};
use crate::journal::{Journal, JournalEvent};
use crate::lifecycle::Lifecycle;
use crate::signal;
use crate::timer::{CancellableTimer, TimerOutcome};

/// The heartbeat daemon.
///
/// `Foreground → Detaching → Running → Stopping → Terminated`. Call
/// [`Daemon::detach`] before any runtime exists, then drive
/// [`Daemon::serve`] on a current-thread runtime.
pub struct Daemon {
    config: DaemonConfig,
    detacher: Box<dyn Detach>,
    state: AtomicU8,
    lifecycle: Lifecycle,
}

impl Daemon {
    /// Create a new daemon instance.
    pub fn new(config: DaemonConfig, detacher: impl Detach + 'static) -> Result<Self, DaemonError> {
        let full = Config {
            daemon: config.clone(),
            ..Default::default()
        };
        let warnings = ConfigValidator::validate(&full).into_result()?;
        for warning in warnings {
            warn!("{}: {}", warning.path, warning.message);
        }

        Ok(Self {
            config,
            detacher: Box::new(detacher),
            state: AtomicU8::new(DaemonState::Foreground as u8),
            lifecycle: Lifecycle::new(),
        })
    }

    /// Get the current daemon state.
    pub fn state(&self) -> DaemonState {
        DaemonState::from(self.state.load(Ordering::SeqCst))
    }

    /// Lifecycle shared with the signal listeners.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Move from `from` to `to`, failing if the daemon is elsewhere.
    fn transition(&self, from: DaemonState, to: DaemonState) -> Result<(), DaemonError> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| debug!("Daemon state: {} -> {}", from, to))
            .map_err(|actual| DaemonError::InvalidStateTransition {
                from: DaemonState::from(actual),
                to,
            })
    }

    /// Detach from the controlling terminal.
    ///
    /// Idempotent: once detached, later calls return `Ok` without touching
    /// the process again.
    pub fn detach(&self) -> Result<(), DaemonError> {
        match self.state() {
            DaemonState::Foreground => {}
            DaemonState::Detaching | DaemonState::Running => {
                debug!("Detach requested again, ignoring");
                return Ok(());
            }
            other => {
                return Err(DaemonError::InvalidStateTransition {
                    from: other,
                    to: DaemonState::Detaching,
                });
            }
        }

        // Held pending until serve() has listeners to receive them
        signal::block_stop_signals()?;

        info!("Detaching using {} strategy", self.detacher.name());
        self.detacher.detach()?;
        self.transition(DaemonState::Foreground, DaemonState::Detaching)
    }

    /// Install SIGTERM/SIGINT handlers and run until one arrives.
    ///
    /// A stop signal that arrived between [`Daemon::detach`] and this call is
    /// delivered as soon as the listeners exist.
    pub async fn serve(&self) -> Result<(), DaemonError> {
        let _listeners = signal::install(&self.lifecycle)?;
        signal::unblock_stop_signals()?;
        self.run_service().await
    }

    /// Open the journal and write ticks until the lifecycle is stopped.
    ///
    /// A stop interrupts the current wait; no tick is written for a partial
    /// interval.
    pub async fn run_service(&self) -> Result<(), DaemonError> {
        let current = self.state();
        if current != DaemonState::Detaching {
            return Err(DaemonError::InvalidStateTransition {
                from: current,
                to: DaemonState::Running,
            });
        }

        let mut journal = Journal::open(&self.config.log_file)?;
        journal.record(JournalEvent::Started)?;
        self.transition(DaemonState::Detaching, DaemonState::Running)?;
        info!(
            "Service started (log: {}, interval: {:?})",
            journal.path().display(),
            self.config.tick_interval()
        );

        let timer = CancellableTimer::new(self.config.tick_interval());
        let mut ticks: u64 = 0;

        while self.lifecycle.is_running() {
            match timer.wait(self.lifecycle.token()).await {
                TimerOutcome::Elapsed => {
                    journal.record(JournalEvent::Tick)?;
                    ticks += 1;
                    debug!("Tick {}", ticks);
                }
                TimerOutcome::Cancelled => break,
            }
        }

        self.transition(DaemonState::Running, DaemonState::Stopping)?;
        info!("Service stopping after {} ticks", ticks);

        journal.record(JournalEvent::Stopped)?;
        journal.close()?;

        self.transition(DaemonState::Stopping, DaemonState::Terminated)?;
        info!("Service stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("config", &self.config)
            .field("detacher", &self.detacher.name())
            .field("state", &self.state())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
