//! Cancellable periodic wait.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Why [`CancellableTimer::wait`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The full interval passed.
    Elapsed,
    /// The token was cancelled first.
    Cancelled,
}

/// Waits up to a fixed interval or until cancellation, whichever comes first.
#[derive(Debug, Clone, Copy)]
pub struct CancellableTimer {
    interval: Duration,
}

impl CancellableTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Wait one interval. An already-cancelled token returns at once.
    pub async fn wait(&self, token: &CancellationToken) -> TimerOutcome {
        tokio::select! {
            biased;
            _ = token.cancelled() => TimerOutcome::Cancelled,
            _ = tokio::time::sleep(self.interval) => TimerOutcome::Elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_wait_elapses_after_interval() {
        let timer = CancellableTimer::new(Duration::from_secs(10));
        let token = CancellationToken::new();
        let start = Instant::now();

        assert_eq!(timer.wait(&token).await, TimerOutcome::Elapsed);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_cancelled_midway() {
        let timer = CancellableTimer::new(Duration::from_secs(10));
        let token = CancellationToken::new();
        let canceller = token.clone();
        let start = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            canceller.cancel();
        });

        assert_eq!(timer.wait(&token).await, TimerOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_precancelled_token_returns_immediately() {
        let timer = CancellableTimer::new(Duration::from_secs(3600));
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(timer.wait(&token).await, TimerOutcome::Cancelled);
    }
}
