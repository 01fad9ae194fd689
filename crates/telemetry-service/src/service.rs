//! Telemetry service object
//!
//! Owns the log, the reader endpoints and the sampler task. Created once at
//! startup and shut down explicitly.

use crate::config_store::ConfigStore;
use crate::settings::ServiceConfig;
use ring_log::{LogStatus, Reader, RingLog, StatusReporter};
use sampler::{max_record_len, Sampler, SamplerConfig, SamplerHandle};
use sensor_adapter::SensorSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{info, warn};

/// Energy log service
pub struct TelemetryService {
    log: Arc<RingLog>,
    reader: Reader,
    status: StatusReporter,
    config_store: ConfigStore,
    sampler_config: SamplerConfig,
    sampler: Mutex<Option<SamplerHandle>>,
    /// Zero point for record timestamps and uptime
    started_at: Instant,
}

impl TelemetryService {
    /// Allocate the log and endpoints without sampling yet
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_slot_len(config, config.slot_len)
    }

    fn with_slot_len(config: &ServiceConfig, slot_len: usize) -> Self {
        let log = Arc::new(RingLog::new(config.log_entries, slot_len));
        info!(
            "Telemetry log allocated: {} entries x {} bytes",
            config.log_entries, slot_len
        );
        Self {
            reader: Reader::new(Arc::clone(&log)),
            status: StatusReporter::new(Arc::clone(&log)),
            log,
            config_store: ConfigStore::new(),
            sampler_config: config.sampler_config(),
            sampler: Mutex::new(None),
            started_at: Instant::now(),
        }
    }

    /// Allocate and start sampling `sensors` on the current tokio runtime
    ///
    /// Slots are widened to the longest record `sensors` can produce.
    pub fn start(config: &ServiceConfig, sensors: SensorSet) -> Self {
        let widest = max_record_len(sensors.cpu.core_count(), sensors.thermal.sensor_count());
        let slot_len = if config.slot_len < widest {
            warn!(
                "slot_len {} too short for {} cores, widening to {}",
                config.slot_len,
                sensors.cpu.core_count(),
                widest
            );
            widest
        } else {
            config.slot_len
        };
        let service = Self::with_slot_len(config, slot_len);
        service.start_sampling(sensors);
        service
    }

    /// Spawn the sampler. Does nothing if one is already running.
    pub fn start_sampling(&self, sensors: SensorSet) {
        let mut slot = self.sampler.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            warn!("Sampler already running");
            return;
        }

        let sampler = Sampler::new(self.sampler_config.clone(), Arc::clone(&self.log), sensors)
            .with_epoch(self.started_at);
        *slot = Some(sampler.spawn());
    }

    /// Stop the sampler and wait for its last tick. Safe to call twice.
    pub async fn shutdown(&self) {
        let handle = self
            .sampler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match handle {
            Some(handle) => {
                handle.shutdown().await;
                info!("Telemetry service stopped");
            }
            None => info!("Telemetry service already stopped"),
        }
    }

    /// Whether the sampler task is alive
    pub fn is_sampling(&self) -> bool {
        self.sampler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(SamplerHandle::is_running)
    }

    /// Drain unread records, at most `max_bytes` of text
    pub fn read(&self, max_bytes: usize) -> String {
        self.reader.read(max_bytes)
    }

    /// Drain unread records with room for a full ring
    pub fn read_all(&self) -> String {
        self.reader.read_all()
    }

    /// Status line
    pub fn status(&self) -> String {
        self.status.status()
    }

    /// Status counters
    pub fn counters(&self) -> LogStatus {
        self.status.counters()
    }

    /// Store a config payload; returns the bytes kept
    pub fn write_config(&self, payload: &[u8]) -> usize {
        self.config_store.write(payload)
    }

    /// Readable content of the config endpoint
    pub fn read_config(&self) -> Vec<u8> {
        self.config_store.read()
    }

    /// Last stored config payload
    pub fn stored_config(&self) -> Vec<u8> {
        self.config_store.stored()
    }

    /// The underlying log
    pub fn log(&self) -> &Arc<RingLog> {
        &self.log
    }

    /// Time since the service was created
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
