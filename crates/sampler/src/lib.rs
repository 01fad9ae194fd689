//! Periodic Telemetry Sampler
//!
//! Reads CPU frequency, TMU temperature and rail power on a fixed interval,
//! formats each reading as one text line and appends it to a [`ring_log::RingLog`].

mod record;
mod scheduler;
mod snapshot;

pub use record::{max_record_len, LogRecord, RecordError, TEMP_FAILURE_MARKER};
pub use scheduler::{Sampler, SamplerConfig, SamplerHandle};
pub use snapshot::{
    code_in_range, SensorSnapshot, SnapshotReader, TemperatureBlock, TEMP_CODE_MAX, TEMP_CODE_MIN,
};
