//! Buffer occupancy counters

use crate::RingLog;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Counters of a [`RingLog`] at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogStatus {
    /// Records ever written (wraps at `u32::MAX`)
    pub total_writes: u32,
    /// Next slot the producer writes
    pub write_cursor: u32,
    /// Next slot a reader consumes
    pub read_cursor: u32,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "index_total: {}, index_log: {}, index_last_read: {}.",
            self.total_writes, self.write_cursor, self.read_cursor
        )
    }
}

/// Read-only view of a log's counters
#[derive(Clone)]
pub struct StatusReporter {
    log: Arc<RingLog>,
}

impl StatusReporter {
    pub fn new(log: Arc<RingLog>) -> Self {
        Self { log }
    }

    /// Current counters
    pub fn counters(&self) -> LogStatus {
        self.log.status_counters()
    }

    /// Status line
    pub fn status(&self) -> String {
        self.counters().to_string()
    }
}
