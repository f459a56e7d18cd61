//! Append-only heartbeat journal.
//!
//! One line per event, `<prefix> YYYY-MM-DD HH:MM:SS`, local time. Every
//! record is flushed before the call returns.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::debug;

use crate::error::DaemonError;

/// `strftime` layout of the timestamp field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Kind of heartbeat record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalEvent {
    Started,
    Tick,
    Stopped,
}

impl JournalEvent {
    const ALL: [JournalEvent; 3] = [
        JournalEvent::Started,
        JournalEvent::Tick,
        JournalEvent::Stopped,
    ];

    /// Line prefix preceding the timestamp.
    pub const fn prefix(&self) -> &'static str {
        match self {
            JournalEvent::Started => "Service started at",
            JournalEvent::Tick => "Tick at",
            JournalEvent::Stopped => "Service stopped at",
        }
    }
}

/// A single journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalEntry {
    pub event: JournalEvent,
    pub timestamp: NaiveDateTime,
}

impl JournalEntry {
    /// Entry stamped with the current local time, truncated to seconds.
    pub fn now(event: JournalEvent) -> Self {
        let now = Local::now().naive_local();
        Self {
            event,
            timestamp: now.with_nanosecond(0).unwrap_or(now),
        }
    }

    /// Parse a line written by [`Journal`]. Trailing newline is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        JournalEvent::ALL.into_iter().find_map(|event| {
            let rest = line.strip_prefix(event.prefix())?.strip_prefix(' ')?;
            let timestamp = NaiveDateTime::parse_from_str(rest, TIMESTAMP_FORMAT).ok()?;
            Some(Self { event, timestamp })
        })
    }
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.event.prefix(),
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}

/// Owned handle on the heartbeat file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Open `path` for appending, creating it if needed. The parent
    /// directory must already exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DaemonError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| DaemonError::LogOpen {
                path: path.clone(),
                source,
            })?;

        debug!("Journal opened: {}", path.display());
        Ok(Self { path, file })
    }

    /// Get the journal path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp `event` with the current time, append and flush it.
    pub fn record(&mut self, event: JournalEvent) -> Result<JournalEntry, DaemonError> {
        let entry = JournalEntry::now(event);
        self.append(&entry)?;
        Ok(entry)
    }

    /// Append and flush a prepared entry.
    pub fn append(&mut self, entry: &JournalEntry) -> Result<(), DaemonError> {
        writeln!(self.file, "{}", entry)
            .and_then(|()| self.file.flush())
            .map_err(|source| DaemonError::LogWrite {
                path: self.path.clone(),
                source,
            })
    }

    /// Flush and close the file.
    pub fn close(mut self) -> Result<(), DaemonError> {
        self.file.flush().map_err(|source| DaemonError::LogWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!("Journal closed: {}", self.path.display());
        Ok(())
    }
}

/// Read every well-formed entry from a journal file, skipping other lines.
pub fn read_entries<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<JournalEntry>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().filter_map(JournalEntry::parse).collect())
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
