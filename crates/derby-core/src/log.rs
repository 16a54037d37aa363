// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Injected logging boundary.
//!
//! The core never writes to stdout or holds file handles; it formats into an
//! injected [`LogSink`]. When no sink is supplied, [`NullLogSink`] discards
//! everything without allocating (messages arrive as [`fmt::Arguments`], not
//! pre-rendered strings).

use std::fmt;
use std::sync::Mutex;

/// Severity of a log record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum LogLevel {
    /// Queue plumbing, enqueue traces.
    Debug,
    /// Normal race narration: moves, rolls, finishes, clamps.
    Info,
    /// Anomalies that were contained: loop skips, unexpected events.
    Warn,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => f.write_str("DEBUG"),
            LogLevel::Info => f.write_str("INFO"),
            LogLevel::Warn => f.write_str("WARN"),
        }
    }
}

/// Receiver for engine log records.
pub trait LogSink: Send + Sync {
    /// Handles one record. `args` is unformatted; sinks that keep the record
    /// render it themselves.
    fn record(&self, level: LogLevel, args: fmt::Arguments<'_>);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn record(&self, _level: LogLevel, _args: fmt::Arguments<'_>) {}
}

/// Buffers rendered records in memory; used by tests and embedders that
/// post-process race logs.
#[derive(Debug, Default)]
pub struct BufferLogSink {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl BufferLogSink {
    /// Creates an empty buffer sink.
    #[must_use]
    pub fn new() -> Self {
        BufferLogSink::default()
    }

    /// Snapshot of the buffered records.
    #[must_use]
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// True if any record at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|(l, s)| *l == level && s.contains(needle))
    }
}

impl LogSink for BufferLogSink {
    fn record(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if let Ok(mut g) = self.lines.lock() {
            g.push((level, args.to_string()));
        }
    }
}
