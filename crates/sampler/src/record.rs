//! Text form of one log line
//!
//! ```text
//! [   12.345678] 61 1400 1400 2000 2000 62 55 80 63 56 81 ... 120000 1012500 121500 850000 1050000 892500
//!  secs.micros   seq  per-core MHz        code err1 err2 per probe  A7 uA/uV/uW, A15 uA/uV/uW
//! ```
//!
//! An abandoned temperature block is written as the single field `-61`.

use crate::snapshot::{SensorSnapshot, TemperatureBlock};
use sensor_adapter::{PowerReading, ThermalReading};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Field written instead of temperatures when the block is abandoned (-ENODATA)
pub const TEMP_FAILURE_MARKER: i32 = -61;

const POWER_FIELDS: usize = 6;

/// Longest line a [`LogRecord`] can format to with `cores` CPU cores and
/// `probes` temperature probes, line break included
pub const fn max_record_len(cores: usize, probes: usize) -> usize {
    // "[secs.micros]" with a full u64 of seconds, then " seq"
    const HEADER: usize = 1 + 20 + 1 + 6 + 1 + 11;
    let temperatures = if probes == 0 { 4 } else { probes * 12 };
    HEADER + cores * 12 + temperatures + POWER_FIELDS * 11 + 1
}

/// Errors while parsing a log line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Line does not start with a `[secs.micros]` stamp
    #[error("Missing or malformed timestamp")]
    BadTimestamp,

    /// A field is not a number of the expected type
    #[error("Invalid {field} field: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Too few fields for the announced core count
    #[error("Expected at least {expected} fields, got {actual}")]
    TooFewFields { expected: usize, actual: usize },

    /// Temperature fields do not come in (code, error1, error2) triples
    #[error("Temperature block has {0} fields, not a multiple of 3")]
    TemperatureArity(usize),
}

/// One sample as stored in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Time since the sampler's epoch, microsecond resolution
    pub timestamp: Duration,
    /// Records written before this one
    pub sequence: u32,
    pub snapshot: SensorSnapshot,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:5}.{:06}] {}",
            self.timestamp.as_secs(),
            self.timestamp.subsec_micros(),
            self.sequence
        )?;

        for mhz in &self.snapshot.cpu_frequencies {
            write!(f, " {mhz}")?;
        }

        match &self.snapshot.temperatures {
            TemperatureBlock::Readings(readings) => {
                for r in readings {
                    write!(f, " {} {} {}", r.code, r.error1, r.error2)?;
                }
            }
            TemperatureBlock::OutOfRange => write!(f, " {TEMP_FAILURE_MARKER}")?,
        }

        for value in self.snapshot.power.fields() {
            write!(f, " {value}")?;
        }

        writeln!(f)
    }
}

impl LogRecord {
    /// Parse one line written by a sampler reading `cores` CPU cores
    pub fn parse(line: &str, cores: usize) -> Result<Self, RecordError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let (stamp, rest) = line
            .strip_prefix('[')
            .and_then(|l| l.split_once(']'))
            .ok_or(RecordError::BadTimestamp)?;
        let timestamp = parse_timestamp(stamp.trim())?;

        let fields: Vec<&str> = rest.split_whitespace().collect();
        let expected = 1 + cores + POWER_FIELDS;
        if fields.len() < expected {
            return Err(RecordError::TooFewFields {
                expected,
                actual: fields.len(),
            });
        }

        let sequence = parse_field(fields[0], "sequence")?;
        let cpu_frequencies = fields[1..1 + cores]
            .iter()
            .map(|f| parse_field(f, "frequency"))
            .collect::<Result<Vec<i32>, _>>()?;

        let temp_end = fields.len() - POWER_FIELDS;
        let temperatures = parse_temperatures(&fields[1 + cores..temp_end])?;

        let mut power = [0u32; POWER_FIELDS];
        for (slot, field) in power.iter_mut().zip(&fields[temp_end..]) {
            *slot = parse_field(field, "power")?;
        }

        Ok(Self {
            timestamp,
            sequence,
            snapshot: SensorSnapshot {
                cpu_frequencies,
                temperatures,
                power: PowerReading::from_fields(power),
            },
        })
    }
}

fn parse_field<T: FromStr>(value: &str, field: &'static str) -> Result<T, RecordError> {
    value.parse().map_err(|_| RecordError::InvalidField {
        field,
        value: value.to_string(),
    })
}

fn parse_timestamp(stamp: &str) -> Result<Duration, RecordError> {
    let (secs, micros) = stamp.split_once('.').ok_or(RecordError::BadTimestamp)?;
    if micros.len() != 6 {
        return Err(RecordError::BadTimestamp);
    }
    let secs: u64 = secs.parse().map_err(|_| RecordError::BadTimestamp)?;
    let micros: u32 = micros.parse().map_err(|_| RecordError::BadTimestamp)?;
    Ok(Duration::new(secs, micros * 1000))
}

fn parse_temperatures(fields: &[&str]) -> Result<TemperatureBlock, RecordError> {
    if let [only] = fields {
        if only.parse::<i32>() == Ok(TEMP_FAILURE_MARKER) {
            return Ok(TemperatureBlock::OutOfRange);
        }
    }
    if fields.len() % 3 != 0 {
        return Err(RecordError::TemperatureArity(fields.len()));
    }

    let readings = fields
        .chunks(3)
        .map(|triple| {
            Ok(ThermalReading {
                code: parse_field(triple[0], "temperature code")?,
                error1: parse_field(triple[1], "error1")?,
                error2: parse_field(triple[2], "error2")?,
            })
        })
        .collect::<Result<Vec<_>, RecordError>>()?;
    Ok(TemperatureBlock::Readings(readings))
}
