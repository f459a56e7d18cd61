//! Diagnostic tracing setup.
//!
//! Separate from the heartbeat file, whose line format is fixed.

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use heartbeat_config::LoggingConfig;
use tracing::Metadata;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt, WithFilter};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Switch for the console layer.
///
/// Once descriptors 0..=2 are closed the runtime reuses them, so anything
/// still writing to "stderr" would land in an epoll, eventfd or signal socket.
/// Muting the gate drops console output from then on.
#[derive(Debug, Clone)]
pub(crate) struct ConsoleGate {
    open: Arc<AtomicBool>,
}

impl ConsoleGate {
    pub(crate) fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn mute(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Wrap `writer` so it only receives events while the gate is open.
    fn wrap<W>(
        &self,
        writer: W,
    ) -> WithFilter<W, impl Fn(&Metadata<'_>) -> bool + Send + Sync + use<W>>
    where
        W: for<'w> MakeWriter<'w>,
    {
        let gate = self.clone();
        writer.with_filter(move |_: &Metadata<'_>| gate.is_open())
    }
}

/// Initialize tracing with console and optional file output.
///
/// The rolling appender is used as a plain blocking writer. A non-blocking
/// writer would start a worker thread, and that thread would not survive the
/// double fork.
pub(crate) fn init_tracing(
    config: &LoggingConfig,
    console: &ConsoleGate,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("heartbeatd")
                .filename_suffix("log")
                .max_log_files(7)
                .build(dir)?;
            Some(fmt::layer().with_writer(file_appender).with_ansi(false))
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(console.wrap(std::io::stderr))
                .with_target(true)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Console-only fallback for when the configured setup is unusable.
pub(crate) fn init_console(console: &ConsoleGate) {
    let _ = tracing_subscriber::fmt()
        .with_writer(console.wrap(std::io::stderr))
        .with_env_filter(EnvFilter::new("info"))
        .try_init();
}
