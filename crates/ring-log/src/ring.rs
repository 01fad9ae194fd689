//! Circular Text Log Implementation

use crate::{floor_char_boundary, LogStatus};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{trace, warn};

/// Default number of slots (6.4 s of history at 5 Hz)
pub const DEFAULT_ENTRIES: usize = 32;

/// Default maximum bytes per record
pub const DEFAULT_SLOT_LEN: usize = 256;

/// Everything the lock guards
struct LogState {
    /// Pre-allocated record storage
    slots: Box<[String]>,
    /// Next slot to write
    write_cursor: usize,
    /// Next slot a reader consumes
    read_cursor: usize,
    /// Records ever written, wrapping
    total_writes: u32,
    /// Records written since the last drain, saturates at capacity
    unread: usize,
}

/// Fixed-capacity circular log of text records
///
/// One producer appends, any number of callers drain through a single shared
/// read cursor. When the producer laps undrained records the oldest ones are
/// overwritten without notice.
pub struct RingLog {
    state: Mutex<LogState>,
    capacity: usize,
    slot_len: usize,
}

impl RingLog {
    /// Create a log with `capacity` slots of at most `slot_len` bytes each
    pub fn new(capacity: usize, slot_len: usize) -> Self {
        assert!(capacity > 0, "RingLog capacity must be > 0");
        assert!(slot_len > 0, "RingLog slot length must be > 0");

        let slots: Vec<String> = (0..capacity)
            .map(|_| String::with_capacity(slot_len))
            .collect();
        Self {
            state: Mutex::new(LogState {
                slots: slots.into_boxed_slice(),
                write_cursor: 0,
                read_cursor: 0,
                total_writes: 0,
                unread: 0,
            }),
            capacity,
            slot_len,
        }
    }

    /// Create a log with the default geometry (32 x 256 bytes)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_ENTRIES, DEFAULT_SLOT_LEN)
    }

    // Every critical section leaves the state consistent, so a panic while
    // holding the lock cannot corrupt it.
    fn lock(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one record, truncating it to the slot length
    pub fn append(&self, record: &str) {
        let mut state = self.lock();
        self.store(&mut state, record);
    }

    /// Append the record built by `build` from the current sequence number
    ///
    /// The sequence number (total writes before this record) and the slot are
    /// assigned under the same lock. Returns the sequence number used.
    pub fn append_with<F>(&self, build: F) -> u32
    where
        F: FnOnce(u32) -> String,
    {
        let mut state = self.lock();
        let sequence = state.total_writes;
        let record = build(sequence);
        self.store(&mut state, &record);
        sequence
    }

    fn store(&self, state: &mut LogState, record: &str) {
        let index = state.write_cursor;
        store_bounded(&mut state.slots[index], record, self.slot_len);

        state.write_cursor = (index + 1) % self.capacity;
        state.total_writes = state.total_writes.wrapping_add(1);
        if state.unread == self.capacity {
            trace!("Slot {} overwritten before it was read", index);
        } else {
            state.unread += 1;
        }
    }

    /// Take every unread record, oldest first, and move the read cursor up to
    /// the write cursor
    pub fn drain_unread(&self) -> String {
        let mut state = self.lock();
        let mut out = String::with_capacity(state.unread * self.slot_len);

        let mut index = (state.write_cursor + self.capacity - state.unread) % self.capacity;
        for _ in 0..state.unread {
            out.push_str(&state.slots[index]);
            index = (index + 1) % self.capacity;
        }

        state.read_cursor = state.write_cursor;
        state.unread = 0;
        out
    }

    /// Snapshot of the counters
    pub fn status_counters(&self) -> LogStatus {
        let state = self.lock();
        LogStatus {
            total_writes: state.total_writes,
            write_cursor: state.write_cursor as u32,
            read_cursor: state.read_cursor as u32,
        }
    }

    /// Number of records a drain would return right now
    pub fn unread(&self) -> usize {
        self.lock().unread
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum bytes per record
    pub fn slot_len(&self) -> usize {
        self.slot_len
    }
}

impl Default for RingLog {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Copy `record` into `slot`, cut to `slot_len` bytes. A truncated line
/// keeps its terminating newline.
fn store_bounded(slot: &mut String, record: &str, slot_len: usize) {
    slot.clear();
    if record.len() <= slot_len {
        slot.push_str(record);
        return;
    }

    warn!(
        "Record of {} bytes truncated to slot length {}",
        record.len(),
        slot_len
    );
    let ends_line = record.ends_with('\n');
    let budget = if ends_line { slot_len - 1 } else { slot_len };
    slot.push_str(&record[..floor_char_boundary(record, budget)]);
    if ends_line {
        slot.push('\n');
    }
}
