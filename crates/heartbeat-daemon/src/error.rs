//! Daemon-related errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during daemon operations.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Process fork failed.
    #[error("Failed to fork process: {0}")]
    ForkFailed(String),

    /// `setsid` was refused.
    #[error("Failed to create new session: {0}")]
    SessionFailed(String),

    /// Could not move to the filesystem root.
    #[error("Failed to change working directory: {0}")]
    WorkDir(String),

    /// Could not detach the standard streams.
    #[error("Failed to detach standard streams: {0}")]
    Stdio(String),

    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// Heartbeat file could not be opened.
    #[error("Failed to open log file {path}: {source}")]
    LogOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Heartbeat record could not be written.
    #[error("Failed to write log file {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid daemon state transition.
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition { from: DaemonState, to: DaemonState },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaemonError {
    /// Process exit status for this failure (sysexits.h values).
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::ForkFailed(_)
            | Self::SessionFailed(_)
            | Self::WorkDir(_)
            | Self::Stdio(_)
            | Self::SignalSetup(_) => 71,
            Self::LogOpen { .. } | Self::LogWrite { .. } => 73,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
            Self::InvalidStateTransition { .. } => 70,
        }
    }
}

impl From<heartbeat_config::ConfigError> for DaemonError {
    fn from(value: heartbeat_config::ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

/// Daemon lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DaemonState {
    /// Attached to the launching terminal.
    Foreground = 0,
    /// Detachment done or in progress; journal not yet open.
    Detaching = 1,
    /// Writing ticks.
    Running = 2,
    /// Stop requested, writing the final record.
    Stopping = 3,
    /// Journal closed.
    Terminated = 4,
}

impl From<u8> for DaemonState {
    fn from(v: u8) -> Self {
        match v {
            0 => DaemonState::Foreground,
            1 => DaemonState::Detaching,
            2 => DaemonState::Running,
            3 => DaemonState::Stopping,
            _ => DaemonState::Terminated,
        }
    }
}

impl std::fmt::Display for DaemonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DaemonState::Foreground => write!(f, "foreground"),
            DaemonState::Detaching => write!(f, "detaching"),
            DaemonState::Running => write!(f, "running"),
            DaemonState::Stopping => write!(f, "stopping"),
            DaemonState::Terminated => write!(f, "terminated"),
        }
    }
}
