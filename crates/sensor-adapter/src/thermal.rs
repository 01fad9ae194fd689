//! Thermal Management Unit (TMU) read interface

use crate::SensorError;

/// Number of TMU probes on the board
pub const TMU_COUNT: usize = 4;

/// Register value reported by a probe that has no current reading
pub const TMU_CODE_UNAVAILABLE: u8 = 0xFF;

/// Per-probe calibration trim values burned into the efuse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calibration {
    pub error1: u8,
    pub error2: u8,
}

/// One probe reading: raw code plus its calibration terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThermalReading {
    pub code: u8,
    pub error1: u8,
    pub error2: u8,
}

/// Handle onto the thermal unit's per-probe registers
pub trait ThermalDevice: Send + Sync {
    /// Number of probes this device exposes
    fn sensor_count(&self) -> usize {
        TMU_COUNT
    }

    /// Read the current temperature code register of one probe
    fn read_temp_code(&self, sensor: usize) -> Result<u8, SensorError>;

    /// Calibration terms for one probe
    fn calibration(&self, sensor: usize) -> Calibration;
}

/// Read one probe, folding the "no data" register value into an error.
pub fn read_probe(device: &dyn ThermalDevice, sensor: usize) -> Result<ThermalReading, SensorError> {
    let count = device.sensor_count();
    if sensor >= count {
        return Err(SensorError::IndexOutOfRange { index: sensor, count });
    }

    let code = device.read_temp_code(sensor)?;
    if code == TMU_CODE_UNAVAILABLE {
        return Err(SensorError::Unavailable(sensor));
    }

    let cal = device.calibration(sensor);
    Ok(ThermalReading {
        code,
        error1: cal.error1,
        error2: cal.error2,
    })
}
