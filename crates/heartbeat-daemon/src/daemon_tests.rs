//! Tests for the daemon state machine and tick loop.

use super::*;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use crate::journal::{JournalEntry, read_entries};

/// Counts calls instead of forking.
#[derive(Clone, Default)]
struct CountingDetacher {
    calls: Arc<AtomicUsize>,
}

impl Detach for CountingDetacher {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn detach(&self) -> Result<(), DaemonError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FailingDetacher;

impl Detach for FailingDetacher {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn detach(&self) -> Result<(), DaemonError> {
        Err(DaemonError::SessionFailed("EPERM".to_string()))
    }
}

fn detached_daemon(log_file: &Path) -> Daemon {
    let daemon = Daemon::new(DaemonConfig::with_log_file(log_file), CountingDetacher::default())
        .unwrap();
    daemon.detach().unwrap();
    daemon
}

fn events(path: &Path) -> Vec<JournalEvent> {
    read_entries(path)
        .unwrap()
        .into_iter()
        .map(|e| e.event)
        .collect()
}

#[test]
fn test_daemon_new() {
    let daemon = Daemon::new(DaemonConfig::default(), CountingDetacher::default()).unwrap();
    assert_eq!(daemon.state(), DaemonState::Foreground);
    assert!(daemon.lifecycle().is_running());
}

#[test]
fn test_daemon_invalid_config() {
    let config = DaemonConfig {
        tick_interval_secs: 0,
        ..Default::default()
    };
    let err = Daemon::new(config, CountingDetacher::default()).unwrap_err();
    assert!(matches!(err, DaemonError::Config(_)));
    assert_eq!(err.exit_code(), 78);
}

#[test]
fn test_detach_is_idempotent() {
    let detacher = CountingDetacher::default();
    let calls = detacher.calls.clone();
    let daemon = Daemon::new(DaemonConfig::default(), detacher).unwrap();

    daemon.detach().unwrap();
    daemon.detach().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(daemon.state(), DaemonState::Detaching);
}

#[test]
fn test_detach_failure_keeps_foreground() {
    let daemon = Daemon::new(DaemonConfig::default(), FailingDetacher).unwrap();

    let err = daemon.detach().unwrap_err();
    assert!(matches!(err, DaemonError::SessionFailed(_)));
    assert_ne!(err.exit_code(), 0);
    assert_eq!(daemon.state(), DaemonState::Foreground);
}

#[tokio::test]
async fn test_run_service_requires_detach() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.log");
    let daemon =
        Daemon::new(DaemonConfig::with_log_file(&path), CountingDetacher::default()).unwrap();

    let err = daemon.run_service().await.unwrap_err();
    assert!(matches!(
        err,
        DaemonError::InvalidStateTransition {
            from: DaemonState::Foreground,
            to: DaemonState::Running
        }
    ));
    assert!(!path.exists());
}

#[tokio::test(start_paused = true)]
async fn test_twenty_five_seconds_yields_two_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.log");
    let daemon = detached_daemon(&path);

    let lifecycle = daemon.lifecycle().clone();
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(25)).await;
        lifecycle.request_stop();
    });

    daemon.run_service().await.unwrap();
    stopper.await.unwrap();

    assert_eq!(
        events(&path),
        vec![
            JournalEvent::Started,
            JournalEvent::Tick,
            JournalEvent::Tick,
            JournalEvent::Stopped,
        ]
    );
    assert_eq!(daemon.state(), DaemonState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_first_tick() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.log");
    let daemon = detached_daemon(&path);

    let lifecycle = daemon.lifecycle().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(4)).await;
        lifecycle.request_stop();
    });

    let started = tokio::time::Instant::now();
    daemon.run_service().await.unwrap();

    // Shutdown does not wait out the interval
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(
        events(&path),
        vec![JournalEvent::Started, JournalEvent::Stopped]
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_requested_before_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.log");
    let daemon = detached_daemon(&path);

    daemon.lifecycle().request_stop();
    daemon.run_service().await.unwrap();

    assert_eq!(
        events(&path),
        vec![JournalEvent::Started, JournalEvent::Stopped]
    );
}

#[tokio::test(start_paused = true)]
async fn test_ticks_are_at_least_one_interval_apart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.log");
    let config = DaemonConfig {
        log_file: path.clone(),
        tick_interval_secs: 2,
        ..Default::default()
    };
    let daemon = Daemon::new(config, CountingDetacher::default()).unwrap();
    daemon.detach().unwrap();

    let lifecycle = daemon.lifecycle().clone();
    let observed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let watcher = {
        let observed = observed.clone();
        let path = path.clone();
        tokio::spawn(async move {
            // Sample the file each virtual second
            for _ in 0..9 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let ticks = read_entries(&path)
                    .map(|entries| {
                        entries
                            .iter()
                            .filter(|e| e.event == JournalEvent::Tick)
                            .count()
                    })
                    .unwrap_or(0);
                observed.lock().unwrap().push(ticks);
            }
            lifecycle.request_stop();
        })
    };

    daemon.run_service().await.unwrap();
    watcher.await.unwrap();

    let observed = observed.lock().unwrap().clone();
    // Never more ticks than whole intervals elapsed
    for (second, ticks) in observed.iter().enumerate() {
        assert!(*ticks <= (second + 1) / 2, "{ticks} ticks after {}s", second + 1);
    }
    let final_ticks = events(&path)
        .into_iter()
        .filter(|e| *e == JournalEvent::Tick)
        .count();
    assert_eq!(final_ticks, 4);
}

#[tokio::test]
async fn test_unopenable_log_file_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("beat.log");
    let daemon = detached_daemon(&path);

    let err = daemon.run_service().await.unwrap_err();
    assert!(matches!(err, DaemonError::LogOpen { .. }));
    assert_eq!(err.exit_code(), 73);
    assert!(!path.exists());
    assert_eq!(daemon.state(), DaemonState::Detaching);
}

#[tokio::test(start_paused = true)]
async fn test_run_appends_to_existing_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.log");
    std::fs::write(&path, "Service stopped at 2020-01-01 00:00:00\n").unwrap();

    let daemon = detached_daemon(&path);
    daemon.lifecycle().request_stop();
    daemon.run_service().await.unwrap();

    let entries: Vec<JournalEntry> = read_entries(&path).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].event, JournalEvent::Started);
}

#[tokio::test(start_paused = true)]
async fn test_run_service_twice_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beat.log");
    let daemon = detached_daemon(&path);

    daemon.lifecycle().request_stop();
    daemon.run_service().await.unwrap();

    let err = daemon.run_service().await.unwrap_err();
    assert!(matches!(err, DaemonError::InvalidStateTransition { .. }));
    assert!(daemon.detach().is_err());
}

#[test]
fn test_debug_shows_strategy() {
    let daemon = Daemon::new(DaemonConfig::default(), CountingDetacher::default()).unwrap();
    let debug = format!("{:?}", daemon);
    assert!(debug.contains("counting"));
    assert!(debug.contains("Foreground"));
}
