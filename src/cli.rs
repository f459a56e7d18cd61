//! CLI definitions for heartbeatd.

use std::path::PathBuf;

use clap::Parser;
use heartbeat_config::Config;

/// heartbeatd CLI.
///
/// Runs with no arguments; every flag only overrides the configuration.
#[derive(Debug, Parser)]
#[command(name = "heartbeatd")]
#[command(about = "Detach from the terminal and log a heartbeat until SIGTERM/SIGINT")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HEARTBEATD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run in foreground (don't detach)
    #[arg(long)]
    pub foreground: bool,

    /// Heartbeat file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply flag overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if self.foreground {
            config.daemon.detach = false;
        }
        if let Some(ref log_file) = self.log_file {
            config.daemon.log_file = log_file.clone();
        }
    }
}
