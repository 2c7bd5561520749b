//! Timestamped line reporting for scan progress and the echo server.
//!
//! The scanner never prints directly; it records lines through an injected
//! [`Reporter`] so embedders and tests can capture output without touching
//! process stdout.

use std::sync::Mutex;

use chrono::Local;

/// A sink for progress and summary lines.
pub trait Reporter: Send + Sync {
    /// Records a single event line.
    fn record(&self, line: &str);
}

/// Prints each line to stdout with a `[YYYY-MM-DD HH:MM:SS]` prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn record(&self, line: &str) {
        println!("[{}] {line}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    }
}

/// Collects recorded lines in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<String>>,
}

impl MemoryReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every line recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl Reporter for MemoryReporter {
    fn record(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryReporter, Reporter};

    #[test]
    fn memory_reporter_keeps_lines_in_order() {
        let reporter = MemoryReporter::new();
        reporter.record("first");
        reporter.record("second");

        assert_eq!(reporter.lines(), vec!["first", "second"]);
    }
}
