//! Write-only configuration buffer

use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Largest payload kept by a config write
pub const MAX_CONFIG_LEN: usize = 128;

/// Holds the last config payload written
///
/// The payload has no effect on sampling; it is kept verbatim.
#[derive(Default)]
pub struct ConfigStore {
    buffer: Mutex<Vec<u8>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(MAX_CONFIG_LEN)),
        }
    }

    /// Store up to [`MAX_CONFIG_LEN`] bytes of `payload`; returns the number kept
    pub fn write(&self, payload: &[u8]) -> usize {
        let len = payload.len().min(MAX_CONFIG_LEN);
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.clear();
        buffer.extend_from_slice(&payload[..len]);

        info!("Config write: {} bytes", len);
        len
    }

    /// Readable content of the config endpoint (always empty)
    pub fn read(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Last stored payload
    pub fn stored(&self) -> Vec<u8> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
