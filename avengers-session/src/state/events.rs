//! Append-only per-mission event log (`logs/execution.jsonl`).
//!
//! One JSON object per line. The log is an observability side channel:
//! nothing in scheduling, tracking or validation reads it back.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{MissionError, Result};

/// Default number of entries returned by [`EventLog::read_recent`].
pub const DEFAULT_LOG_LIMIT: usize = 20;

/// A single event log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event stamped with the current time.
    pub fn append(&self, event: &str, data: Value) -> Result<()> {
        self.append_entry(&LogEntry {
            timestamp: Utc::now(),
            event: event.to_string(),
            data,
        })
    }

    pub fn append_entry(&self, entry: &LogEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| MissionError::io(parent, e))?;
        }

        let mut line = serde_json::to_string(entry)
            .map_err(|e| MissionError::invalid_state(&self.path, e))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MissionError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| MissionError::io(&self.path, e))?;

        debug!(log = %self.path.display(), event = %entry.event, "appended event");
        Ok(())
    }

    /// Return the last `limit` well-formed entries, oldest first.
    ///
    /// A missing log is empty. Lines that fail to parse are skipped so a
    /// corrupted tail does not hide the rest of the log.
    pub fn read_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MissionError::io(&self.path, e)),
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    warn!(log = %self.path.display(), error = %e, "stopped reading event log");
                    break;
                }
            };
            if line.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            match serde_json::from_slice::<LogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!(log = %self.path.display(), line = index + 1, error = %e, "skipping malformed log line");
                }
            }
        }

        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn log_in(temp: &TempDir) -> EventLog {
        EventLog::new(temp.path().join("logs").join("execution.jsonl"))
    }

    #[test]
    fn test_append_and_read() {
        let temp = TempDir::new().unwrap();
        let log = log_in(&temp);

        log.append("mission_created", json!({"mission_id": "m1"}))
            .unwrap();
        log.append("execution_started", json!({"total_phases": 2}))
            .unwrap();

        let entries = log.read_recent(DEFAULT_LOG_LIMIT).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, "mission_created");
        assert_eq!(entries[1].data["total_phases"], 2);
    }

    #[test]
    fn test_read_with_limit_returns_latest() {
        let temp = TempDir::new().unwrap();
        let log = log_in(&temp);
        for event in ["a", "b", "c"] {
            log.append(event, Value::Null).unwrap();
        }

        let entries = log.read_recent(2).unwrap();
        let events: Vec<_> = entries.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events, vec!["b", "c"]);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(log_in(&temp).read_recent(20).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let temp = TempDir::new().unwrap();
        let log = log_in(&temp);
        log.append("first", Value::Null).unwrap();

        let mut file = OpenOptions::new().append(true).open(log.path()).unwrap();
        file.write_all(b"{not json\n\n").unwrap();
        file.write_all(&[0xff, 0xfe, b'\n']).unwrap();
        drop(file);

        log.append("last", Value::Null).unwrap();

        let entries = log.read_recent(20).unwrap();
        let events: Vec<_> = entries.iter().map(|e| e.event.as_str()).collect();
        assert_eq!(events, vec!["first", "last"]);
    }

    #[test]
    fn test_missing_data_defaults_to_null() {
        let temp = TempDir::new().unwrap();
        let log = log_in(&temp);
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(
            log.path(),
            "{\"timestamp\":\"2026-02-06T12:00:00Z\",\"event\":\"bare\"}\n",
        )
        .unwrap();

        let entries = log.read_recent(20).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data, Value::Null);
    }
}
