//! Sensor Error Types

use thiserror::Error;

/// Errors that can occur while reading a sensor channel
#[derive(Debug, Error)]
pub enum SensorError {
    /// Channel exists but has no data right now
    #[error("Sensor channel {0} has no data")]
    Unavailable(usize),

    /// Channel index beyond what the device exposes
    #[error("Sensor index {index} out of range (device has {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Underlying file or register read failed
    #[error("Read error on {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Raw value could not be interpreted
    #[error("Failed to parse {path}: {detail}")]
    Parse { path: String, detail: String },
}
