//! Simulated big.LITTLE board
//!
//! Produces deterministic pseudo-random readings for all three sensor
//! interfaces so the service can run without hardware.

use crate::{
    Calibration, CpuFrequencySource, PowerMonitor, PowerReading, SensorError, ThermalDevice,
    TMU_COUNT,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Simulated board: little cores first, then big cores
pub struct MockSensors {
    cores: usize,
    /// Advanced once per power sample, i.e. once per tick
    step: AtomicU64,
    /// Fixed register values that override the generated ones
    forced_codes: [Option<u8>; TMU_COUNT],
}

impl MockSensors {
    /// Create a simulated board with `cores` CPU cores
    pub fn new(cores: usize) -> Self {
        info!("Creating mock sensors with {} cores", cores);
        Self {
            cores,
            step: AtomicU64::new(0),
            forced_codes: [None; TMU_COUNT],
        }
    }

    /// Pin one probe's temperature register to `code`
    pub fn with_temp_code(mut self, sensor: usize, code: u8) -> Self {
        if let Some(slot) = self.forced_codes.get_mut(sensor) {
            *slot = Some(code);
        }
        self
    }

    fn hash(&self, channel: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.step.load(Ordering::Relaxed).hash(&mut hasher);
        channel.hash(&mut hasher);
        hasher.finish()
    }

    fn is_little(&self, core: usize) -> bool {
        core < self.cores.div_ceil(2)
    }
}

impl CpuFrequencySource for MockSensors {
    fn core_count(&self) -> usize {
        self.cores
    }

    fn current_khz(&self, core: usize) -> Result<u32, SensorError> {
        if core >= self.cores {
            return Err(SensorError::IndexOutOfRange {
                index: core,
                count: self.cores,
            });
        }
        // 100 MHz steps: A7 200-1400 MHz, A15 200-2000 MHz
        let steps = if self.is_little(core) { 13 } else { 19 };
        let mhz = 200 + (self.hash(core as u64) % steps) as u32 * 100;
        Ok(mhz * 1000)
    }
}

impl ThermalDevice for MockSensors {
    fn read_temp_code(&self, sensor: usize) -> Result<u8, SensorError> {
        if sensor >= TMU_COUNT {
            return Err(SensorError::IndexOutOfRange {
                index: sensor,
                count: TMU_COUNT,
            });
        }
        if let Some(code) = self.forced_codes[sensor] {
            return Ok(code);
        }
        // Codes 60-89, well inside the valid window
        Ok(60 + (self.hash(0x100 + sensor as u64) % 30) as u8)
    }

    fn calibration(&self, sensor: usize) -> Calibration {
        Calibration {
            error1: 55 + sensor as u8,
            error2: 80 + sensor as u8,
        }
    }
}

impl PowerMonitor for MockSensors {
    fn sample(&self) -> Result<PowerReading, SensorError> {
        let a7_current_ua = 50_000 + (self.hash(0x200) % 250_000) as u32;
        let a7_voltage_uv = 900_000 + (self.hash(0x201) % 200_000) as u32;
        let a15_current_ua = 200_000 + (self.hash(0x202) % 1_800_000) as u32;
        let a15_voltage_uv = 900_000 + (self.hash(0x203) % 350_000) as u32;
        self.step.fetch_add(1, Ordering::Relaxed);

        Ok(PowerReading {
            a7_current_ua,
            a7_voltage_uv,
            a7_power_uw: watts_micro(a7_current_ua, a7_voltage_uv),
            a15_current_ua,
            a15_voltage_uv,
            a15_power_uw: watts_micro(a15_current_ua, a15_voltage_uv),
        })
    }
}

/// P[uW] = I[uA] * V[uV] / 1e6
fn watts_micro(current_ua: u32, voltage_uv: u32) -> u32 {
    (current_ua as u64 * voltage_uv as u64 / 1_000_000) as u32
}
