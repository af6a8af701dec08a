use crate::error::StorageError;
use crate::indicator::{BlinkPattern, Color, Delay, Indicator, StatusSignal};
use crate::row::{Field, Row};
use crate::sensor::{Channel, SensorReader};
use crate::store::{Delivery, FallbackSink, LogStore, Storage};
use enumset::{enum_set, EnumSet};
use log::{debug, error, info};

/// Header label of the restart column.
pub const RESTART_COLUMN: &str = "restart";

/// Parameters of one sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Samples averaged per row.
    pub n_samples: u32,

    /// Pause after each sample, in milliseconds.
    pub sample_delay_ms: u32,

    /// Pause after each row, in milliseconds.
    pub iteration_delay_ms: u32,

    /// Channels sampled, in column order.
    pub channels: EnumSet<Channel>,

    /// Append the restart flag as the last column.
    pub include_restart_flag: bool,
}

impl SamplingConfig {
    /// Calibration preset: both thermistors, fast cadence.
    pub const fn calibration() -> Self {
        Self {
            n_samples: 3,
            sample_delay_ms: 0,
            iteration_delay_ms: 100,
            channels: enum_set!(Channel::Temperature1 | Channel::Temperature2),
            include_restart_flag: false,
        }
    }

    /// Measurement preset: all probes, one row every five minutes.
    pub const fn measurement() -> Self {
        Self {
            n_samples: 10,
            sample_delay_ms: 100,
            iteration_delay_ms: 300_000,
            channels: enum_set!(Channel::Temperature1 | Channel::Temperature2 | Channel::Light),
            include_restart_flag: true,
        }
    }

    /// Header row matching the data rows this configuration produces.
    pub fn header(&self) -> Row {
        let mut row: Row = self
            .channels
            .iter()
            .map(|channel| Field::Label(channel.column_name()))
            .collect();
        if self.include_restart_flag {
            row.push(Field::Label(RESTART_COLUMN));
        }
        row
    }
}

/// Marks the first row written after power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartFlag(bool);

impl RestartFlag {
    /// Raised flag, as at process start.
    pub fn new() -> Self {
        Self(true)
    }

    /// Column value: 1 until the first row is delivered, then 0.
    pub fn value(self) -> u8 {
        u8::from(self.0)
    }

    /// Lower the flag for good.
    pub fn clear(&mut self) {
        self.0 = false;
    }
}

impl Default for RestartFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Rows go to the log file.
    Running,

    /// The log file is read-only; rows go to the fallback sink.
    Degraded,

    /// Storage failed; the device blinks `pattern` until serviced.
    Halted(BlinkPattern),
}

/// Averages readings into rows and hands them to the log store.
pub struct SamplingLoop<S, F, I, D> {
    config: SamplingConfig,
    sensors: SensorReader,
    store: LogStore<S, F>,
    signal: StatusSignal<I, D>,
    restart: RestartFlag,
    state: DeviceState,

    /// The header went to the fallback sink and still has to reach the file.
    header_pending: bool,
}

impl<S: Storage, F: FallbackSink, I: Indicator, D: Delay> SamplingLoop<S, F, I, D> {
    /// Create a sampling loop.
    ///
    /// # Arguments
    /// * `config` - Sampling parameters.
    /// * `sensors` - The probes.
    /// * `store` - Destination of the averaged rows.
    /// * `signal` - Status light and delay.
    pub fn new(
        config: SamplingConfig,
        sensors: SensorReader,
        store: LogStore<S, F>,
        signal: StatusSignal<I, D>,
    ) -> Self {
        Self {
            config,
            sensors,
            store,
            signal,
            restart: RestartFlag::new(),
            state: DeviceState::Running,
            header_pending: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// The restart flag that the next row will carry.
    pub fn restart_flag(&self) -> RestartFlag {
        self.restart
    }

    /// Write the header row if the log file is new.
    ///
    /// A halting storage failure moves the loop to `Halted`; a failing
    /// existence check is returned. A diverted header is retried before the
    /// next data row.
    pub fn prepare(&mut self) -> Result<DeviceState, StorageError> {
        match self.write_header() {
            Err(err @ StorageError::Inaccessible { .. }) => return Err(err),
            Err(err) => self.halt(self.store.pattern_for(&err)),
            Ok(()) => {}
        }
        Ok(self.state)
    }

    /// Average one set of samples into a row.
    pub fn sample(&mut self) -> Row {
        let mut sums = [0.0f64; 3];

        self.signal.set(Color::Yellow);
        for _ in 0..self.config.n_samples {
            for (sum, channel) in sums.iter_mut().zip(self.config.channels.iter()) {
                *sum += self.sensors.read(channel);
            }
            self.signal.pause(self.config.sample_delay_ms);
        }
        self.signal.set(Color::Off);

        let n = f64::from(self.config.n_samples.max(1));
        let mut row: Row = sums
            .iter()
            .take(self.config.channels.len())
            .map(|sum| Field::Value(sum / n))
            .collect();
        if self.config.include_restart_flag {
            row.push(Field::Flag(self.restart.value()));
        }
        row
    }

    /// Run one iteration: sample, append, pause.
    ///
    /// A halted loop does nothing.
    pub fn step(&mut self) -> DeviceState {
        if let DeviceState::Halted(_) = self.state {
            return self.state;
        }

        let row = self.sample();
        debug!("Averaged row: {row}");

        // The file must not start with a data row.
        if self.header_pending {
            if let Err(err) = self.write_header() {
                self.halt(self.store.pattern_for(&err));
                return self.state;
            }
        }

        match self.store.append(&row, &mut self.signal) {
            Ok(delivery) => {
                self.record(delivery);
                self.restart.clear();
                self.signal.pause(self.config.iteration_delay_ms);
            }
            Err(err) => self.halt(self.store.pattern_for(&err)),
        }

        self.state
    }

    /// Run forever. Once halted, blink the halt pattern forever.
    pub fn run(mut self) -> ! {
        loop {
            if let DeviceState::Halted(pattern) = self.step() {
                self.signal.blink_forever(pattern);
            }
        }
    }

    fn write_header(&mut self) -> Result<(), StorageError> {
        let header = self.config.header();
        let delivery = self.store.ensure_header(&header, &mut self.signal)?;

        self.header_pending = delivery == Some(Delivery::Diverted);
        if let Some(delivery) = delivery {
            self.record(delivery);
        }
        Ok(())
    }

    fn record(&mut self, delivery: Delivery) {
        self.state = match (self.state, delivery) {
            (DeviceState::Degraded, Delivery::Written) => {
                info!("{} is writable again", self.store.path().display());
                DeviceState::Running
            }
            (_, Delivery::Written) => DeviceState::Running,
            (_, Delivery::Diverted) => DeviceState::Degraded,
        };
    }

    fn halt(&mut self, pattern: BlinkPattern) {
        error!(
            "Halting: {} cannot be written, service the device",
            self.store.path().display()
        );
        self.state = DeviceState::Halted(pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ENOSPC, EROFS};
    use crate::indicator::tests::{
        recording_signal, Event, RecordingDelay, RecordingIndicator, Trace,
    };
    use crate::indicator::ErrorClassTable;
    use crate::sensor::tests::reader;
    use crate::store::tests::{MemStorage, VecSink};
    use crate::thermistor::Thermistor;

    type TestLoop = SamplingLoop<MemStorage, VecSink, RecordingIndicator, RecordingDelay>;

    fn sampling_loop(
        config: SamplingConfig,
        sensors: SensorReader,
    ) -> (TestLoop, MemStorage, VecSink, Trace) {
        let storage = MemStorage::default();
        let sink = VecSink::default();
        let (signal, trace) = recording_signal();
        let store = LogStore::new(
            "data.csv",
            storage.clone(),
            sink.clone(),
            ErrorClassTable::standard(),
        );
        (SamplingLoop::new(config, sensors, store, signal), storage, sink, trace)
    }

    fn lines(storage: &MemStorage) -> Vec<String> {
        storage
            .contents("data.csv")
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn headers_match_row_shapes() {
        assert_eq!(
            SamplingConfig::calibration().header().to_string(),
            "temperature 1, temperature 2"
        );
        assert_eq!(
            SamplingConfig::measurement().header().to_string(),
            "temperature 1, temperature 2, light, restart"
        );
    }

    #[test]
    fn identical_samples_average_to_single_conversion() {
        let config = SamplingConfig {
            n_samples: 7,
            ..SamplingConfig::measurement()
        };
        let (mut lp, ..) = sampling_loop(config, reader(&[31_000], &[29_500], &[12_000]));

        let row = lp.sample();
        let t = Thermistor::default();
        let expected = [
            t.raw_to_celsius(31_000),
            t.raw_to_celsius(29_500),
            t.raw_to_voltage(12_000),
        ];
        for (field, expected) in row.fields().iter().zip(expected) {
            match field {
                Field::Value(value) => assert!((value - expected).abs() < 1e-9),
                other => panic!("unexpected field {other:?}"),
            }
        }
        assert_eq!(row.fields()[3], Field::Flag(1));
    }

    #[test]
    fn sampling_shows_yellow_and_paces_samples() {
        let (mut lp, _, _, trace) =
            sampling_loop(SamplingConfig::measurement(), reader(&[30_000], &[30_000], &[30_000]));

        lp.sample();

        let trace = trace.borrow();
        assert_eq!(trace.first(), Some(&Event::Set(Color::Yellow)));
        assert_eq!(trace.last(), Some(&Event::Set(Color::Off)));
        assert_eq!(trace.iter().filter(|e| **e == Event::Wait(100)).count(), 10);
    }

    #[test]
    fn calibration_has_no_sample_delay() {
        let (mut lp, _, _, trace) =
            sampling_loop(SamplingConfig::calibration(), reader(&[30_000], &[30_000], &[30_000]));

        let row = lp.sample();

        assert_eq!(row.len(), 2);
        assert_eq!(
            *trace.borrow(),
            [Event::Set(Color::Yellow), Event::Set(Color::Off)]
        );
    }

    #[test]
    fn restart_flag_is_set_only_on_first_row() {
        let (mut lp, storage, ..) =
            sampling_loop(SamplingConfig::measurement(), reader(&[30_000], &[30_000], &[30_000]));

        assert_eq!(lp.prepare().unwrap(), DeviceState::Running);
        for _ in 0..3 {
            assert_eq!(lp.step(), DeviceState::Running);
        }

        let lines = lines(&storage);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "temperature 1, temperature 2, light, restart");
        assert!(lines[1].ends_with(", 1"));
        assert!(lines[2].ends_with(", 0"));
        assert!(lines[3].ends_with(", 0"));
        assert_eq!(lp.restart_flag().value(), 0);
    }

    #[test]
    fn header_is_not_repeated() {
        let (mut lp, storage, ..) =
            sampling_loop(SamplingConfig::calibration(), reader(&[30_000], &[30_000], &[30_000]));

        lp.prepare().unwrap();
        lp.step();
        lp.prepare().unwrap();
        lp.step();

        let lines = lines(&storage);
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("temperature")).count(),
            1
        );
    }

    #[test]
    fn step_pauses_for_iteration_delay() {
        let (mut lp, _, _, trace) =
            sampling_loop(SamplingConfig::calibration(), reader(&[30_000], &[30_000], &[30_000]));

        lp.step();

        assert_eq!(trace.borrow().last(), Some(&Event::Wait(100)));
    }

    #[test]
    fn read_only_storage_degrades_and_continues() {
        let (mut lp, storage, sink, _) =
            sampling_loop(SamplingConfig::measurement(), reader(&[30_000], &[30_000], &[30_000]));
        storage.fail_writes_with(Some(EROFS));

        assert_eq!(lp.step(), DeviceState::Degraded);
        assert_eq!(lp.step(), DeviceState::Degraded);
        assert_eq!(sink.0.borrow().len(), 2);
        assert!(sink.0.borrow()[0].ends_with(", 1"));
        assert!(sink.0.borrow()[1].ends_with(", 0"));
        assert_eq!(storage.contents("data.csv"), None);

        storage.fail_writes_with(None);
        assert_eq!(lp.step(), DeviceState::Running);
        assert_eq!(lines(&storage).len(), 1);
    }

    #[test]
    fn header_diverted_at_startup_leads_the_file_once_writable() {
        let (mut lp, storage, sink, _) =
            sampling_loop(SamplingConfig::measurement(), reader(&[30_000], &[30_000], &[30_000]));
        storage.fail_writes_with(Some(EROFS));

        assert_eq!(lp.prepare().unwrap(), DeviceState::Degraded);
        assert_eq!(lp.step(), DeviceState::Degraded);
        storage.fail_writes_with(None);
        assert_eq!(lp.step(), DeviceState::Running);
        assert_eq!(lp.step(), DeviceState::Running);

        let lines = lines(&storage);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "temperature 1, temperature 2, light, restart");
        assert!(lines[1].ends_with(", 0"));
        assert_eq!(
            lines.iter().filter(|l| l.starts_with("temperature")).count(),
            1
        );
        assert_eq!(
            sink.0.borrow()[0],
            "temperature 1, temperature 2, light, restart"
        );
    }

    #[test]
    fn header_recovers_before_first_data_row() {
        let (mut lp, storage, ..) =
            sampling_loop(SamplingConfig::measurement(), reader(&[30_000], &[30_000], &[30_000]));
        storage.fail_writes_with(Some(EROFS));
        assert_eq!(lp.prepare().unwrap(), DeviceState::Degraded);

        storage.fail_writes_with(None);
        assert_eq!(lp.step(), DeviceState::Running);

        let lines = lines(&storage);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "temperature 1, temperature 2, light, restart");
        assert!(lines[1].ends_with(", 1"));
    }

    #[test]
    fn out_of_space_halts_for_good() {
        let (mut lp, storage, sink, trace) =
            sampling_loop(SamplingConfig::calibration(), reader(&[30_000], &[30_000], &[30_000]));
        storage.fail_writes_with(Some(ENOSPC));

        let halted = DeviceState::Halted(ErrorClassTable::standard().out_of_space);
        assert_eq!(lp.step(), halted);

        let events = trace.borrow().len();
        storage.fail_writes_with(None);
        assert_eq!(lp.step(), halted);
        assert_eq!(trace.borrow().len(), events);
        assert_eq!(storage.contents("data.csv"), None);
        assert!(sink.0.borrow().is_empty());
    }

    #[test]
    fn unclassified_failure_halts_with_default_pattern() {
        let (mut lp, storage, ..) =
            sampling_loop(SamplingConfig::calibration(), reader(&[30_000], &[30_000], &[30_000]));
        storage.fail_writes_with(Some(13)); // EACCES

        assert_eq!(
            lp.step(),
            DeviceState::Halted(ErrorClassTable::standard().default)
        );
    }

    #[test]
    fn header_failure_halts_before_sampling() {
        let (mut lp, storage, _, trace) =
            sampling_loop(SamplingConfig::measurement(), reader(&[30_000], &[30_000], &[30_000]));
        storage.fail_writes_with(Some(ENOSPC));

        assert!(matches!(lp.prepare(), Ok(DeviceState::Halted(_))));
        lp.step();
        assert!(!trace.borrow().contains(&Event::Set(Color::Yellow)));
    }

    #[test]
    fn inaccessible_log_is_a_startup_error() {
        let storage = MemStorage {
            exists_error: Some(std::io::ErrorKind::PermissionDenied),
            ..MemStorage::default()
        };
        let (signal, _) = recording_signal();
        let store = LogStore::new(
            "data.csv",
            storage,
            VecSink::default(),
            ErrorClassTable::standard(),
        );
        let mut lp = SamplingLoop::new(
            SamplingConfig::calibration(),
            reader(&[30_000], &[30_000], &[30_000]),
            store,
            signal,
        );

        assert!(matches!(lp.prepare(), Err(StorageError::Inaccessible { .. })));
        assert_eq!(lp.state(), DeviceState::Running);
    }
}
