//! Run the daemon: detach, then serve on a single-threaded runtime.

use heartbeat_config::{Config, StdioMode};
use heartbeat_daemon::{Daemon, DaemonError, Supervised};
use tracing::info;

use crate::logging::ConsoleGate;

/// Build the daemon for `config`, detach, and serve until stopped.
pub(crate) fn run(config: Config, console: &ConsoleGate) -> Result<(), DaemonError> {
    let closes_stdio = closes_stdio(&config);
    let daemon = build_daemon(config)?;

    // No runtime (and so no threads) may exist before the fork
    daemon.detach()?;
    if closes_stdio {
        // fds 0..=2 are free now and the runtime will reuse them
        console.mute();
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(daemon.serve())?;
    info!("heartbeatd exiting");
    Ok(())
}

/// Whether detaching leaves descriptors 0..=2 closed.
fn closes_stdio(config: &Config) -> bool {
    cfg!(unix) && config.daemon.detach && config.daemon.stdio == StdioMode::Close
}

#[cfg(unix)]
fn build_daemon(config: Config) -> Result<Daemon, DaemonError> {
    use heartbeat_daemon::DoubleFork;

    let daemon_config = config.daemon;
    if daemon_config.detach {
        let strategy = DoubleFork::new(daemon_config.stdio);
        Daemon::new(daemon_config, strategy)
    } else {
        Daemon::new(daemon_config, Supervised)
    }
}

#[cfg(not(unix))]
fn build_daemon(config: Config) -> Result<Daemon, DaemonError> {
    tracing::warn!("Detachment is only supported on Unix, running supervised");
    Daemon::new(config.daemon, Supervised)
}
