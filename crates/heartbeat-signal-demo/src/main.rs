//! signal-demo: print a counter until Ctrl+C.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use heartbeat_signal_demo::{DEFAULT_INTERVAL, interrupt_listener, run_until_interrupt};

/// Print an incrementing counter until interrupted.
#[derive(Parser)]
#[command(name = "signal-demo")]
#[command(version)]
struct Args {
    /// Seconds between counter lines
    #[arg(long, default_value_t = DEFAULT_INTERVAL.as_secs())]
    interval_secs: u64,
}

/// Diagnostics go to stderr so stdout carries only the demo output.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let interval = Duration::from_secs(args.interval_secs.max(1));

    let interrupt = match interrupt_listener() {
        Ok(interrupt) => interrupt,
        Err(e) => {
            error!("Failed to install SIGINT handler: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout().lock();
    match run_until_interrupt(&mut stdout, interval, interrupt).await {
        Ok(signo) => {
            info!("Exiting on signal {}", signo);
            // No cleanup: leave straight from the interrupt path
            std::process::exit(0);
        }
        Err(e) => {
            error!("Failed to write to stdout: {}", e);
            ExitCode::FAILURE
        }
    }
}
