//! Pull-based log reader

use crate::{truncate_at_boundary, RingLog};
use std::sync::Arc;
use tracing::debug;

/// Drains unread records from a [`RingLog`]
///
/// All readers of one log share its read cursor: a record handed to one
/// caller is never returned to another.
#[derive(Clone)]
pub struct Reader {
    log: Arc<RingLog>,
}

impl Reader {
    pub fn new(log: Arc<RingLog>) -> Self {
        Self { log }
    }

    /// Return every record written since the last read, cut to `max_bytes`
    ///
    /// Records beyond `max_bytes` are consumed all the same.
    pub fn read(&self, max_bytes: usize) -> String {
        let mut text = self.log.drain_unread();
        if text.len() > max_bytes {
            debug!("Read truncated from {} to {} bytes", text.len(), max_bytes);
            truncate_at_boundary(&mut text, max_bytes);
        }
        text
    }

    /// Read with room for a full ring
    pub fn read_all(&self) -> String {
        self.read(self.log.capacity() * self.log.slot_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(n: u32) -> Arc<RingLog> {
        let log = Arc::new(RingLog::new(32, 64));
        for _ in 0..n {
            log.append_with(|seq| format!("[    0.000000] {seq}\n"));
        }
        log
    }

    #[test]
    fn test_read_returns_unread() {
        let reader = Reader::new(filled(3));
        let text = reader.read_all();
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with("] 2\n"));
        assert_eq!(reader.read_all(), "");
    }

    #[test]
    fn test_read_truncates_but_consumes() {
        let log = filled(3);
        let reader = Reader::new(Arc::clone(&log));
        let text = reader.read(20);
        assert_eq!(text, "[    0.000000] 0\n[  ");
        assert_eq!(log.unread(), 0);
        assert_eq!(reader.read_all(), "");
    }

    #[test]
    fn test_readers_share_cursor() {
        let log = filled(2);
        let first = Reader::new(Arc::clone(&log));
        let second = first.clone();

        assert_eq!(first.read_all().lines().count(), 2);
        assert_eq!(second.read_all(), "");

        log.append("late\n");
        assert_eq!(second.read_all(), "late\n");
        assert_eq!(first.read_all(), "");
    }

    #[test]
    fn test_lap_scenario() {
        let log = filled(40);
        let reader = Reader::new(log);
        let text = reader.read_all();
        let sequences: Vec<u32> = text
            .lines()
            .map(|l| l.rsplit(' ').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(sequences, (8..40).collect::<Vec<_>>());
        assert_eq!(reader.read_all(), "");
    }
}
