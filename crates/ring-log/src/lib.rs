//! Circular Telemetry Log
//!
//! A fixed-capacity ring of text records shared between one periodic
//! producer and on-demand readers. All access goes through a single lock.

mod ring;
mod reader;
mod status;

pub use ring::{RingLog, DEFAULT_ENTRIES, DEFAULT_SLOT_LEN};
pub use reader::Reader;
pub use status::{LogStatus, StatusReporter};

/// Largest index `<= max` that lies on a char boundary of `s`
pub fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// Truncate `s` to at most `max` bytes without splitting a character
pub fn truncate_at_boundary(s: &mut String, max: usize) {
    let end = floor_char_boundary(s, max);
    s.truncate(end);
}
