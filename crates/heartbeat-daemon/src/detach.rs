//! Detachment strategies.
//!
//! [`DoubleFork`] is the classic Unix recipe. [`Supervised`] is for processes
//! that a supervisor (systemd, launchd, a container runtime) already keeps in
//! the background, or for `--foreground` debugging.

use tracing::info;

use crate::error::DaemonError;

/// Turns the calling process into a background process.
pub trait Detach: Send + Sync {
    /// Short strategy name for logs.
    fn name(&self) -> &'static str;

    /// Detach the process. Calling it again after success must be a no-op.
    fn detach(&self) -> Result<(), DaemonError>;
}

/// No-op strategy: stay in the current process, keep the streams and cwd.
#[derive(Debug, Clone, Copy, Default)]
pub struct Supervised;

impl Detach for Supervised {
    fn name(&self) -> &'static str {
        "supervised"
    }

    fn detach(&self) -> Result<(), DaemonError> {
        info!("Running supervised, not detaching (PID: {})", std::process::id());
        Ok(())
    }
}

#[cfg(unix)]
pub use self::unix::DoubleFork;

#[cfg(unix)]
mod unix {
    use std::os::fd::{IntoRawFd, RawFd};
    use std::sync::atomic::{AtomicBool, Ordering};

    use nix::sys::stat::{Mode, umask};
    use nix::unistd::{ForkResult, chdir, close, dup2, fork, setsid};
    use tracing::{debug, info};

    use heartbeat_config::StdioMode;

    use super::Detach;
    use crate::error::DaemonError;

    /// Set once this process is the detached grandchild.
    static DETACHED: AtomicBool = AtomicBool::new(false);

    const STDIO_FDS: [RawFd; 3] = [0, 1, 2];

    /// Fork, `setsid`, fork again; then umask 0, `chdir /`, and detach stdio.
    ///
    /// Must run before any threads (including a tokio runtime) exist: only
    /// the calling thread survives `fork`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DoubleFork {
        stdio: StdioMode,
    }

    impl DoubleFork {
        pub fn new(stdio: StdioMode) -> Self {
            Self { stdio }
        }

        /// Whether this process already went through a double fork.
        pub fn is_detached() -> bool {
            DETACHED.load(Ordering::SeqCst)
        }
    }

    impl Detach for DoubleFork {
        fn name(&self) -> &'static str {
            "double-fork"
        }

        fn detach(&self) -> Result<(), DaemonError> {
            if Self::is_detached() {
                debug!("Already detached, skipping");
                return Ok(());
            }

            info!("Daemonizing process...");

            // First fork: the launcher returns to the shell
            fork_and_exit_parent()?;

            setsid().map_err(|e| DaemonError::SessionFailed(e.to_string()))?;

            // Second fork: a non-leader can never reacquire a controlling terminal
            fork_and_exit_parent()?;

            umask(Mode::empty());
            chdir("/").map_err(|e| DaemonError::WorkDir(e.to_string()))?;
            detach_stdio(self.stdio)?;

            DETACHED.store(true, Ordering::SeqCst);
            info!("Process daemonized (PID: {})", std::process::id());
            Ok(())
        }
    }

    fn fork_and_exit_parent() -> Result<(), DaemonError> {
        // SAFETY: only called from `DoubleFork::detach`, which runs while the
        // process is still single-threaded.
        match unsafe { fork() } {
            Ok(ForkResult::Parent { .. }) => std::process::exit(0),
            Ok(ForkResult::Child) => Ok(()),
            Err(e) => Err(DaemonError::ForkFailed(e.to_string())),
        }
    }

    fn detach_stdio(mode: StdioMode) -> Result<(), DaemonError> {
        match mode {
            StdioMode::Null => {
                let dev_null = std::fs::OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open("/dev/null")
                    .map_err(|e| {
                        DaemonError::Stdio(format!("Failed to open /dev/null: {}", e))
                    })?;

                let fd = dev_null.into_raw_fd();
                for target in STDIO_FDS {
                    if fd != target {
                        dup2(fd, target)
                            .map_err(|e| DaemonError::Stdio(format!("dup2 {}: {}", target, e)))?;
                    }
                }
                // Keep it if it landed on 0..=2 itself
                if !STDIO_FDS.contains(&fd) {
                    close(fd).ok();
                }
            }
            StdioMode::Close => {
                for target in STDIO_FDS {
                    // Already closed is fine
                    close(target).ok();
                }
            }
        }
        Ok(())
    }
}
