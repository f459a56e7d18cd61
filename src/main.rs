//! heartbeatd - minimal heartbeat daemon
//!
//! Detaches from the terminal, appends a timestamped line to a log file every
//! interval, and exits cleanly on SIGTERM or SIGINT.

mod cli;
mod cmd_run;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use heartbeat_config::{Config, ConfigLoader, ConfigValidator};
use heartbeat_daemon::DaemonError;

use crate::cli::Cli;
use crate::logging::ConsoleGate;

/// Load, override, and pin the configuration before anything changes directory.
fn load_config(cli: &Cli) -> Result<Config, DaemonError> {
    let mut config = ConfigLoader::discover(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let launch_dir = std::env::current_dir()?;
    config.resolve_relative_paths(&launch_dir);

    ConfigValidator::validate(&config).into_result()?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let console = ConsoleGate::new();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init_console(&console);
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    if let Err(e) = logging::init_tracing(&config.logging, &console) {
        logging::init_console(&console);
        warn!("Diagnostic log setup failed, using console only: {}", e);
    }

    info!("Starting heartbeatd v{}", env!("CARGO_PKG_VERSION"));

    match cmd_run::run(config, &console) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
