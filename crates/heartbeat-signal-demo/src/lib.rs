//! Counter loop that prints every interval until SIGINT arrives.

use std::future::Future;
use std::io::{self, Write};
use std::time::Duration;

use tracing::debug;

/// Delay between counter lines.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Printed after every counter value.
pub const PROMPT_LINE: &str = "press Ctrl+C to stop";

/// Monotonic counter starting at 0.
#[derive(Debug, Default)]
pub struct Counter {
    value: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current value and advance.
    pub fn next(&mut self) -> u64 {
        let value = self.value;
        self.value += 1;
        value
    }
}

pub fn ack_line(signo: i32) -> String {
    format!("Caught signal {}", signo)
}

/// Print the counter and the prompt now and every `interval` after, until `interrupt`
/// resolves with a signal number. Writes the acknowledgment and returns that
/// number; nothing else is printed after it.
pub async fn run_until_interrupt<W, F>(out: &mut W, interval: Duration, interrupt: F) -> io::Result<i32>
where
    W: Write,
    F: Future<Output = i32>,
{
    tokio::pin!(interrupt);
    let mut counter = Counter::new();

    loop {
        let value = counter.next();
        writeln!(out, "{}", value)?;
        writeln!(out, "{}", PROMPT_LINE)?;
        out.flush()?;
        debug!("Printed counter {}", value);

        tokio::select! {
            biased;
            signo = &mut interrupt => {
                writeln!(out, "{}", ack_line(signo))?;
                out.flush()?;
                return Ok(signo);
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Register for SIGINT now; the returned future resolves on delivery.
///
/// Registration happens before this returns, so a SIGINT sent after the first
/// counter line is never lost. Must be called inside a tokio runtime.
#[cfg(unix)]
pub fn interrupt_listener() -> io::Result<impl Future<Output = i32>> {
    use nix::sys::signal::Signal;
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    Ok(async move {
        sigint.recv().await;
        Signal::SIGINT as i32
    })
}

/// Ctrl+C listener (non-Unix fallback).
#[cfg(not(unix))]
pub fn interrupt_listener() -> io::Result<impl Future<Output = i32>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
        2
    })
}
