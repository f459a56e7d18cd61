//! # Heartbeat Daemon
//!
//! Lifecycle management for a single-process heartbeat daemon.
//!
//! ## Features
//!
//! - Double-fork detachment from the controlling terminal (Unix)
//! - Supervised mode for systemd/launchd/containers (no fork)
//! - SIGTERM/SIGINT graceful shutdown through a shared [`Lifecycle`] flag
//! - Cancellable periodic timer
//! - Append-only heartbeat journal
//!
//! ## Usage
//!
//! ```rust,ignore
//! use heartbeat_daemon::{Daemon, DaemonConfig, DoubleFork};
//!
//! let config = DaemonConfig::default();
//! let daemon = Daemon::new(config.clone(), DoubleFork::new(config.stdio))?;
//! daemon.detach()?;
//!
//! // Only build the runtime once the process is detached.
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()?;
//! runtime.block_on(daemon.serve())?;
//! ```

pub mod daemon;
pub mod detach;
pub mod error;
pub mod journal;
pub mod lifecycle;
pub mod signal;
pub mod timer;

// Re-exports
pub use daemon::Daemon;
pub use detach::{Detach, Supervised};
pub use error::{DaemonError, DaemonState};
pub use heartbeat_config::{DaemonConfig, StdioMode};
pub use journal::{Journal, JournalEntry, JournalEvent};
pub use lifecycle::Lifecycle;
pub use signal::{SignalListeners, StopSignal};
pub use timer::{CancellableTimer, TimerOutcome};

#[cfg(unix)]
pub use detach::DoubleFork;
