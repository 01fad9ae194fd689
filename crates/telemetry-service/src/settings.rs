//! Service configuration
//!
//! Loaded from an optional `energy-log.toml` in the working directory, then
//! overridden by `ENERGY_LOG_*` environment variables
//! (e.g. `ENERGY_LOG_SAMPLING_INTERVAL_MS=100`).

use crate::ServiceError;
use ring_log::{DEFAULT_ENTRIES, DEFAULT_SLOT_LEN};
use sampler::{max_record_len, SamplerConfig};
use sensor_adapter::{MockSensors, SensorSet, SysfsCpuFreq, TMU_COUNT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Default config file stem, searched in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "energy-log";

/// Prefix of overriding environment variables
pub const ENV_PREFIX: &str = "ENERGY_LOG";

/// Where sensor readings come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    /// Fully simulated board
    Mock,
    /// Real cpufreq from sysfs, simulated thermal and power
    Sysfs,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Delay between samples (ms)
    pub sampling_interval_ms: u64,
    /// Number of records the log holds
    pub log_entries: usize,
    /// Maximum bytes per record
    pub slot_len: usize,
    /// HTTP listen address
    pub listen_addr: String,
    pub sensors: SensorBackend,
    /// Core count of the simulated board
    pub cores: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sampling_interval_ms: 200,
            log_entries: DEFAULT_ENTRIES,
            slot_len: DEFAULT_SLOT_LEN,
            listen_addr: "127.0.0.1:8080".into(),
            sensors: SensorBackend::Mock,
            cores: 8,
        }
    }
}

impl ServiceConfig {
    /// Load from `energy-log.toml` and the environment
    pub fn load() -> Result<Self, ServiceError> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load from the config file `name` (extension optional) and the environment
    pub fn load_from(name: &str) -> Result<Self, ServiceError> {
        Self::load_with_env(name, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(name: &str, environment: config::Environment) -> Result<Self, ServiceError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(name).required(false))
            .add_source(environment.try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Reject settings the log or sampler cannot run with
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.sampling_interval_ms == 0 {
            return Err(ServiceError::InvalidConfig("sampling_interval_ms must be > 0".into()));
        }
        if self.log_entries == 0 {
            return Err(ServiceError::InvalidConfig("log_entries must be > 0".into()));
        }
        if self.slot_len == 0 {
            return Err(ServiceError::InvalidConfig("slot_len must be > 0".into()));
        }
        // The sysfs core count is only known at startup, where slots are widened instead.
        let widest = max_record_len(self.cores, TMU_COUNT);
        if self.sensors == SensorBackend::Mock && self.slot_len < widest {
            return Err(ServiceError::InvalidConfig(format!(
                "slot_len {} cannot hold a {}-core record ({} bytes)",
                self.slot_len, self.cores, widest
            )));
        }
        Ok(())
    }

    /// Sampler settings
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            interval_ms: self.sampling_interval_ms,
        }
    }

    /// Build the configured sensor backends
    pub fn sensor_set(&self) -> SensorSet {
        match self.sensors {
            SensorBackend::Mock => SensorSet::mock(self.cores),
            SensorBackend::Sysfs => {
                let board = Arc::new(MockSensors::new(self.cores));
                SensorSet::new(Arc::new(SysfsCpuFreq::new()), board.clone(), board)
            }
        }
    }
}
