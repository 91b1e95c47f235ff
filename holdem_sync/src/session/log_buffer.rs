//! Bounded activity log shown alongside the table.

use chrono::{DateTime, Utc};
use std::{collections::VecDeque, fmt};

use super::notifier::Severity;

/// Entries kept when no capacity is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 50;

/// A timestamped activity record.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} {:5}]: {}",
            self.timestamp.format("%H:%M:%S"),
            self.severity.to_string(),
            self.message
        )
    }
}

/// Append-only log with a fixed capacity.
///
/// Entries are kept oldest first. When full, appending evicts the oldest
/// entry. Entries are never modified once appended.
#[derive(Clone, Debug)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl LogBuffer {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, entry: LogEntry) {
        log::log!(entry.severity.level(), "{}", entry.message);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Shorthand for appending a fresh entry stamped now.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.append(LogEntry::new(severity, message));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Copy of the entries, oldest first.
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
