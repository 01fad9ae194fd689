//! One reading of every sensor

use sensor_adapter::{read_probe, PowerReading, SensorError, SensorSet, ThermalReading, TMU_COUNT};
use tracing::{debug, warn};

/// Lowest valid TMU code
pub const TEMP_CODE_MIN: u8 = 46;

/// First TMU code past the valid window
pub const TEMP_CODE_MAX: u8 = 146;

/// Whether a raw TMU code lies in `[TEMP_CODE_MIN, TEMP_CODE_MAX)`
pub fn code_in_range(code: u8) -> bool {
    (TEMP_CODE_MIN..TEMP_CODE_MAX).contains(&code)
}

/// Temperature part of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemperatureBlock {
    /// One reading per probe, all codes in range
    Readings(Vec<ThermalReading>),
    /// At least one probe had no usable code; no values are reported
    OutOfRange,
}

/// Sensor values for one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSnapshot {
    /// Per-core frequency in MHz, 0 for cores that could not be read
    pub cpu_frequencies: Vec<i32>,
    pub temperatures: TemperatureBlock,
    pub power: PowerReading,
}

/// Takes snapshots from a [`SensorSet`]
///
/// A channel that fails to read keeps reporting its previous value.
pub struct SnapshotReader {
    sensors: SensorSet,
    last_thermal: Vec<Option<ThermalReading>>,
    last_power: PowerReading,
}

impl SnapshotReader {
    pub fn new(sensors: SensorSet) -> Self {
        let probes = sensors.thermal.sensor_count().min(TMU_COUNT);
        Self {
            sensors,
            last_thermal: vec![None; probes],
            last_power: PowerReading::default(),
        }
    }

    /// Read every sensor once
    pub fn capture(&mut self) -> SensorSnapshot {
        SensorSnapshot {
            cpu_frequencies: self.read_frequencies(),
            temperatures: self.read_temperatures(),
            power: self.read_power(),
        }
    }

    fn read_frequencies(&self) -> Vec<i32> {
        let cpu = &self.sensors.cpu;
        (0..cpu.core_count())
            .map(|core| match cpu.current_khz(core) {
                Ok(khz) => (khz / 1000) as i32,
                Err(e) => {
                    debug!("cpu{} frequency unavailable: {}", core, e);
                    0
                }
            })
            .collect()
    }

    fn read_temperatures(&mut self) -> TemperatureBlock {
        let device = self.sensors.thermal.as_ref();
        for (sensor, last) in self.last_thermal.iter_mut().enumerate() {
            match read_probe(device, sensor) {
                Ok(reading) => *last = Some(reading),
                Err(SensorError::Unavailable(_)) => {
                    debug!("TMU probe {} has no data, keeping previous reading", sensor);
                }
                Err(e) => warn!("TMU probe {} read failed: {}", sensor, e),
            }
        }

        let mut readings = Vec::with_capacity(self.last_thermal.len());
        for (sensor, last) in self.last_thermal.iter().enumerate() {
            match last {
                Some(reading) if code_in_range(reading.code) => readings.push(*reading),
                Some(reading) => {
                    debug!("TMU probe {} code {} out of range", sensor, reading.code);
                    return TemperatureBlock::OutOfRange;
                }
                None => {
                    debug!("TMU probe {} has never reported", sensor);
                    return TemperatureBlock::OutOfRange;
                }
            }
        }
        TemperatureBlock::Readings(readings)
    }

    fn read_power(&mut self) -> PowerReading {
        match self.sensors.power.sample() {
            Ok(reading) => self.last_power = reading,
            Err(e) => warn!("Power sample failed, repeating previous: {}", e),
        }
        self.last_power
    }
}
