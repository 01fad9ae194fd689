//! Periodic Sampler Task

use crate::record::{max_record_len, LogRecord};
use crate::snapshot::SnapshotReader;
use ring_log::RingLog;
use sensor_adapter::SensorSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Configuration for the sampler
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Delay between the end of one tick and the start of the next (default: 200)
    pub interval_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { interval_ms: 200 }
    }
}

impl SamplerConfig {
    /// Delay between ticks
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Samples every sensor and appends one record per tick
pub struct Sampler {
    config: SamplerConfig,
    log: Arc<RingLog>,
    reader: SnapshotReader,
    /// Zero point of record timestamps
    epoch: Instant,
}

impl Sampler {
    /// Create a sampler whose timestamps count from now
    pub fn new(config: SamplerConfig, log: Arc<RingLog>, sensors: SensorSet) -> Self {
        info!(
            "Sampler created: interval={}ms, {:?}",
            config.interval_ms, sensors
        );
        let widest = max_record_len(sensors.cpu.core_count(), sensors.thermal.sensor_count());
        if log.slot_len() < widest {
            warn!(
                "Log slot length {} is below the widest record ({} bytes), records may be cut",
                log.slot_len(),
                widest
            );
        }
        Self {
            config,
            log,
            reader: SnapshotReader::new(sensors),
            epoch: Instant::now(),
        }
    }

    /// Count timestamps from `epoch` instead
    pub fn with_epoch(mut self, epoch: Instant) -> Self {
        self.epoch = epoch;
        self
    }

    /// Take one sample now. Returns the record's sequence number.
    pub fn tick(&mut self) -> u32 {
        let elapsed = self.epoch.elapsed();
        self.tick_at(elapsed)
    }

    /// Take one sample stamped with `timestamp`
    pub fn tick_at(&mut self, timestamp: Duration) -> u32 {
        let snapshot = self.reader.capture();
        let sequence = self.log.append_with(move |sequence| {
            LogRecord {
                timestamp,
                sequence,
                snapshot,
            }
            .to_string()
        });
        debug!("Tick {} recorded", sequence);
        sequence
    }

    /// Run on the current tokio runtime until the returned handle is shut down
    /// or dropped
    pub fn spawn(self) -> SamplerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));
        SamplerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.config.interval();
        info!("Starting sampler");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        break;
                    }
                    continue;
                }
            }

            // No await point past here: a tick always completes once started.
            self.tick();
        }

        info!(
            "Sampler stopped after {} records",
            self.log.status_counters().total_writes
        );
    }
}

/// Owner of a running sampler task
pub struct SamplerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    /// Stop rescheduling and wait for an in-flight tick to finish
    pub async fn shutdown(self) {
        info!("Stopping sampler");
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Sampler task ended abnormally: {}", e);
        }
    }

    /// Whether the task is still alive
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TemperatureBlock, TEMP_FAILURE_MARKER};
    use ring_log::Reader;
    use sensor_adapter::{
        Calibration, CpuFrequencySource, MockSensors, PowerMonitor, PowerReading, SensorError,
        ThermalDevice, TMU_CODE_UNAVAILABLE, TMU_COUNT,
    };
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Board whose readings the test controls
    struct TestBoard {
        codes: Mutex<[u8; TMU_COUNT]>,
        power_fails: AtomicBool,
        power_calls: Mutex<u32>,
        /// Signalled at the start of every power sample
        started: Option<Arc<Notify>>,
        power_delay: Duration,
    }

    impl TestBoard {
        fn new(codes: [u8; TMU_COUNT]) -> Self {
            Self {
                codes: Mutex::new(codes),
                power_fails: AtomicBool::new(false),
                power_calls: Mutex::new(0),
                started: None,
                power_delay: Duration::ZERO,
            }
        }

        fn set_codes(&self, codes: [u8; TMU_COUNT]) {
            *self.codes.lock().unwrap() = codes;
        }
    }

    impl CpuFrequencySource for TestBoard {
        fn core_count(&self) -> usize {
            2
        }

        fn current_khz(&self, core: usize) -> Result<u32, SensorError> {
            match core {
                0 => Ok(1_400_000),
                _ => Err(SensorError::Unavailable(core)),
            }
        }
    }

    impl ThermalDevice for TestBoard {
        fn read_temp_code(&self, sensor: usize) -> Result<u8, SensorError> {
            Ok(self.codes.lock().unwrap()[sensor])
        }

        fn calibration(&self, sensor: usize) -> Calibration {
            Calibration {
                error1: 50 + sensor as u8,
                error2: 70 + sensor as u8,
            }
        }
    }

    impl PowerMonitor for TestBoard {
        fn sample(&self) -> Result<PowerReading, SensorError> {
            if let Some(started) = &self.started {
                started.notify_one();
            }
            if !self.power_delay.is_zero() {
                std::thread::sleep(self.power_delay);
            }
            let mut calls = self.power_calls.lock().unwrap();
            *calls += 1;
            if self.power_fails.load(Ordering::Relaxed) {
                return Err(SensorError::Unavailable(0));
            }
            Ok(PowerReading::from_fields([*calls, 2, 3, 4, 5, 6]))
        }
    }

    fn sampler_for(board: Arc<TestBoard>) -> (Sampler, Arc<RingLog>) {
        let log = Arc::new(RingLog::new(32, 256));
        let sampler = Sampler::new(
            SamplerConfig::default(),
            Arc::clone(&log),
            SensorSet::from_board(board),
        );
        (sampler, log)
    }

    fn last_record(log: &RingLog) -> LogRecord {
        let text = log.drain_unread();
        let line = text.lines().last().unwrap();
        LogRecord::parse(line, 2).unwrap()
    }

    #[test]
    fn test_tick_formats_record() {
        let board = Arc::new(TestBoard::new([60, 61, 62, 63]));
        let (mut sampler, log) = sampler_for(board);

        assert_eq!(sampler.tick_at(Duration::from_micros(3_000_042)), 0);
        assert_eq!(
            log.drain_unread(),
            "[    3.000042] 0 1400 0 60 50 70 61 51 71 62 52 72 63 53 73 1 2 3 4 5 6\n"
        );
        assert_eq!(sampler.tick(), 1);
    }

    #[test]
    fn test_out_of_range_code_abandons_block() {
        let board = Arc::new(TestBoard::new([200, 61, 62, 63]));
        let (mut sampler, log) = sampler_for(board);

        sampler.tick_at(Duration::ZERO);
        let text = log.drain_unread();
        assert_eq!(text, format!("[    0.000000] 0 1400 0 {TEMP_FAILURE_MARKER} 1 2 3 4 5 6\n"));
        assert!(!text.contains(" 61 "));
    }

    #[test]
    fn test_code_window_boundaries() {
        let board = Arc::new(TestBoard::new([46, 145, 100, 100]));
        let (mut sampler, log) = sampler_for(Arc::clone(&board));

        sampler.tick_at(Duration::ZERO);
        assert!(matches!(last_record(&log).snapshot.temperatures, TemperatureBlock::Readings(_)));

        for codes in [[45, 100, 100, 100], [100, 100, 100, 146]] {
            board.set_codes(codes);
            sampler.tick_at(Duration::ZERO);
            assert_eq!(last_record(&log).snapshot.temperatures, TemperatureBlock::OutOfRange);
        }
    }

    #[test]
    fn test_unavailable_probe_keeps_previous_reading() {
        let board = Arc::new(TestBoard::new([60, 61, 62, 63]));
        let (mut sampler, log) = sampler_for(Arc::clone(&board));
        sampler.tick_at(Duration::ZERO);
        let first = last_record(&log);

        board.set_codes([70, TMU_CODE_UNAVAILABLE, 72, 73]);
        sampler.tick_at(Duration::ZERO);
        let second = last_record(&log);

        let TemperatureBlock::Readings(readings) = second.snapshot.temperatures else {
            panic!("expected readings");
        };
        assert_eq!(readings[0].code, 70);
        assert_eq!(readings[1].code, 61);
        assert_eq!(first.snapshot.cpu_frequencies, vec![1400, 0]);
    }

    #[test]
    fn test_probe_that_never_reported_is_failure() {
        let board = Arc::new(TestBoard::new([60, TMU_CODE_UNAVAILABLE, 62, 63]));
        let (mut sampler, log) = sampler_for(board);
        sampler.tick_at(Duration::ZERO);
        assert_eq!(last_record(&log).snapshot.temperatures, TemperatureBlock::OutOfRange);
    }

    #[test]
    fn test_power_failure_repeats_previous() {
        let board = Arc::new(TestBoard::new([60, 61, 62, 63]));
        let (mut sampler, log) = sampler_for(Arc::clone(&board));
        sampler.tick_at(Duration::ZERO);

        board.power_fails.store(true, Ordering::Relaxed);
        sampler.tick_at(Duration::ZERO);
        let record = last_record(&log);
        assert_eq!(record.sequence, 1);
        assert_eq!(record.snapshot.power, PowerReading::from_fields([1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn test_mock_board_out_of_range_sensor() {
        let log = Arc::new(RingLog::new(4, 256));
        let board = Arc::new(MockSensors::new(4).with_temp_code(0, 200));
        let mut sampler = Sampler::new(
            SamplerConfig::default(),
            Arc::clone(&log),
            SensorSet::from_board(board),
        );
        sampler.tick();

        let record = LogRecord::parse(&Reader::new(log).read_all(), 4).unwrap();
        assert_eq!(record.snapshot.temperatures, TemperatureBlock::OutOfRange);
    }

    #[test]
    fn test_many_core_record_fits_sized_slot() {
        let cores = 64;
        let log = Arc::new(RingLog::new(4, max_record_len(cores, TMU_COUNT)));
        let sensors = SensorSet::mock(cores);
        let mut sampler = Sampler::new(SamplerConfig::default(), Arc::clone(&log), sensors);
        sampler.tick_at(Duration::new(99_999, 999_999_000));

        let record = LogRecord::parse(&log.drain_unread(), cores).unwrap();
        assert_eq!(record.snapshot.cpu_frequencies.len(), cores);
        assert!(matches!(
            record.snapshot.temperatures,
            TemperatureBlock::Readings(ref r) if r.len() == TMU_COUNT
        ));
    }

    #[test]
    fn test_default_slot_fits_eight_cores() {
        let log = Arc::new(RingLog::new(4, ring_log::DEFAULT_SLOT_LEN));
        let sensors = SensorSet::mock(8);
        let mut sampler = Sampler::new(SamplerConfig::default(), Arc::clone(&log), sensors);
        sampler.tick_at(Duration::new(99_999, 999_999_000));

        let record = LogRecord::parse(&log.drain_unread(), 8).unwrap();
        assert_eq!(record.sequence, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_ticks_stop_on_shutdown() {
        let log = Arc::new(RingLog::new(32, 256));
        let sampler = Sampler::new(SamplerConfig::default(), Arc::clone(&log), SensorSet::mock(4));
        let handle = sampler.spawn();
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        handle.shutdown().await;
        assert_eq!(log.status_counters().total_writes, 5);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(log.status_counters().total_writes, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_stops_sampler() {
        let log = Arc::new(RingLog::new(32, 256));
        let sampler = Sampler::new(SamplerConfig::default(), Arc::clone(&log), SensorSet::mock(2));
        drop(sampler.spawn());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(log.status_counters().total_writes, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_waits_for_tick_in_flight() {
        let started = Arc::new(Notify::new());
        let board = Arc::new(TestBoard {
            started: Some(Arc::clone(&started)),
            power_delay: Duration::from_millis(150),
            ..TestBoard::new([60, 61, 62, 63])
        });
        let log = Arc::new(RingLog::new(32, 256));
        let sampler = Sampler::new(
            SamplerConfig { interval_ms: 10 },
            Arc::clone(&log),
            SensorSet::from_board(board),
        );
        let handle = sampler.spawn();

        started.notified().await;
        assert_eq!(log.status_counters().total_writes, 0);
        handle.shutdown().await;
        assert_eq!(log.status_counters().total_writes, 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(log.status_counters().total_writes, 1);
    }
}
