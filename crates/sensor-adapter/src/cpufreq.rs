//! CPU frequency read interface
//!
//! [`SysfsCpuFreq`] reads `cpuN/cpufreq/scaling_cur_freq` under
//! `/sys/devices/system/cpu`. The kernel reports kHz; offline cores have no
//! `cpufreq` directory and fail the read.

use crate::SensorError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Base sysfs path for CPU information
pub const CPU_BASE: &str = "/sys/devices/system/cpu";

/// Source of per-core frequencies
pub trait CpuFrequencySource: Send + Sync {
    /// Number of cores reported on every tick, online or not
    fn core_count(&self) -> usize;

    /// Current frequency of one core in kHz
    fn current_khz(&self, core: usize) -> Result<u32, SensorError>;
}

/// cpufreq reader backed by sysfs
#[derive(Debug, Clone)]
pub struct SysfsCpuFreq {
    base: PathBuf,
    cores: usize,
}

impl SysfsCpuFreq {
    /// Reader over the standard sysfs location, sized from the `cpuN` entries present
    pub fn new() -> Self {
        Self::with_base(CPU_BASE)
    }

    /// Reader over an alternative root laid out like `/sys/devices/system/cpu`
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let cores = count_cpu_dirs(&base)
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1);
        debug!("cpufreq reader over {} with {} cores", base.display(), cores);
        Self { base, cores }
    }

    fn freq_path(&self, core: usize) -> PathBuf {
        self.base
            .join(format!("cpu{core}"))
            .join("cpufreq")
            .join("scaling_cur_freq")
    }
}

impl Default for SysfsCpuFreq {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuFrequencySource for SysfsCpuFreq {
    fn core_count(&self) -> usize {
        self.cores
    }

    fn current_khz(&self, core: usize) -> Result<u32, SensorError> {
        let path = self.freq_path(core);
        let content = std::fs::read_to_string(&path).map_err(|e| SensorError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let content = content.trim();
        content.parse::<u32>().map_err(|_| SensorError::Parse {
            path: path.display().to_string(),
            detail: format!("expected integer kHz value, got '{content}'"),
        })
    }
}

/// Count `cpu[0-9]+` directories under `base`.
fn count_cpu_dirs(base: &Path) -> Option<usize> {
    let entries = std::fs::read_dir(base).ok()?;
    let count = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.len() > 3 && name.starts_with("cpu") && name[3..].chars().all(|c| c.is_ascii_digit())
        })
        .count();
    (count > 0).then_some(count)
}
