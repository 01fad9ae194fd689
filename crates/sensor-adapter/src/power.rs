//! INA231 power monitor read interface

use crate::SensorError;

/// One sample of both monitored rails
///
/// The A7 rail feeds the little cluster, the A15 rail the big cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerReading {
    pub a7_current_ua: u32,
    pub a7_voltage_uv: u32,
    pub a7_power_uw: u32,
    pub a15_current_ua: u32,
    pub a15_voltage_uv: u32,
    pub a15_power_uw: u32,
}

impl PowerReading {
    /// Fields in log order
    pub fn fields(&self) -> [u32; 6] {
        [
            self.a7_current_ua,
            self.a7_voltage_uv,
            self.a7_power_uw,
            self.a15_current_ua,
            self.a15_voltage_uv,
            self.a15_power_uw,
        ]
    }

    /// Inverse of [`PowerReading::fields`]
    pub fn from_fields(f: [u32; 6]) -> Self {
        Self {
            a7_current_ua: f[0],
            a7_voltage_uv: f[1],
            a7_power_uw: f[2],
            a15_current_ua: f[3],
            a15_voltage_uv: f[4],
            a15_power_uw: f[5],
        }
    }
}

/// Source of power samples
pub trait PowerMonitor: Send + Sync {
    /// Take one sample of all rails
    fn sample(&self) -> Result<PowerReading, SensorError>;
}
