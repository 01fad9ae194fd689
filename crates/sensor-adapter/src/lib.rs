//! Sensor Read Adapters
//!
//! Interfaces the sampler calls to take one reading of CPU frequency,
//! TMU temperature (with calibration terms) and INA231 rail power.
//! Backends are owned elsewhere; every call here is a plain read.

mod cpufreq;
mod error;
mod mock;
mod power;
mod thermal;

pub use cpufreq::{CpuFrequencySource, SysfsCpuFreq, CPU_BASE};
pub use error::SensorError;
pub use mock::MockSensors;
pub use power::{PowerMonitor, PowerReading};
pub use thermal::{
    read_probe, Calibration, ThermalDevice, ThermalReading, TMU_CODE_UNAVAILABLE, TMU_COUNT,
};

use std::sync::Arc;

/// The three sensor sources a sampler reads on every tick
#[derive(Clone)]
pub struct SensorSet {
    pub cpu: Arc<dyn CpuFrequencySource>,
    pub thermal: Arc<dyn ThermalDevice>,
    pub power: Arc<dyn PowerMonitor>,
}

impl SensorSet {
    /// Bundle independent sources
    pub fn new(
        cpu: Arc<dyn CpuFrequencySource>,
        thermal: Arc<dyn ThermalDevice>,
        power: Arc<dyn PowerMonitor>,
    ) -> Self {
        Self { cpu, thermal, power }
    }

    /// All three sources backed by one simulated board
    pub fn mock(cores: usize) -> Self {
        Self::from_board(Arc::new(MockSensors::new(cores)))
    }

    /// All three sources backed by one object
    pub fn from_board<B>(board: Arc<B>) -> Self
    where
        B: CpuFrequencySource + ThermalDevice + PowerMonitor + 'static,
    {
        Self {
            cpu: board.clone(),
            thermal: board.clone(),
            power: board,
        }
    }
}

impl std::fmt::Debug for SensorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSet")
            .field("cores", &self.cpu.core_count())
            .field("probes", &self.thermal.sensor_count())
            .finish()
    }
}
