//! Progress and diagnostic logging for load and query runs.
//!
//! Every entry is echoed to stderr (stdout is reserved for query output) and
//! broadcast to subscribers, so embedding callers and tests can observe which
//! files were loaded or skipped.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Echoes entries to stderr and fans them out to subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    quiet: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender, quiet: AtomicBool::new(false) }
    }

    /// Send a log entry to all subscribers
    pub fn log(&self, entry: LogEntry) {
        if !self.quiet.load(Ordering::Relaxed) {
            let prefix = match entry.level {
                LogLevel::Info => "   ",
                LogLevel::Success => "   ✓",
                LogLevel::Warning => "   ⚠️",
                LogLevel::Error => "   ❌",
            };
            let indent = "   ".repeat(entry.indent as usize);
            eprintln!("{}{} {}", indent, prefix, entry.message);
        }

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    /// Stop echoing to stderr. Subscribers still receive entries.
    pub fn set_quiet(&self, quiet: bool) {
        self.quiet.store(quiet, Ordering::Relaxed);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::info(msg).with_indent(indent));
}

pub fn log_warning_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::warning(msg).with_indent(indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_entries() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_quiet(true);
        let mut rx = broadcaster.subscribe();

        broadcaster.log(LogEntry::warning("skipped a.json").with_indent(1));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.message, "skipped a.json");
        assert_eq!(entry.indent, 1);
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_value(LogEntry::success("done")).unwrap();
        assert_eq!(json["level"], "success");
        assert_eq!(json["message"], "done");
    }
}
