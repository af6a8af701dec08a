use crate::error::{ConfigError, StorageError};
use crate::indicator::{Color, Delay, ErrorClassTable, Indicator, StatusSignal, BOOT_FLASH_MS};
use crate::sampling::{SamplingConfig, SamplingLoop};
use crate::sensor::SensorReader;
use crate::store::{FallbackSink, LogStore, Storage};
use log::info;
use std::path::Path;
use std::str::FromStr;

/// Run mode, fixed at deploy time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fast logging of both thermistors side by side.
    Calibration,

    /// Slow logging of all probes with a restart marker.
    Measurement,
}

impl Mode {
    /// Look up a mode by its numeric code (1 = calibration, 2 = measurement).
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        match code {
            1 => Ok(Mode::Calibration),
            2 => Ok(Mode::Measurement),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }

    /// Name of the mode's log file.
    pub fn log_file_name(self) -> &'static str {
        match self {
            Mode::Calibration => "temp_sensor_calibration.csv",
            Mode::Measurement => "plant_envdata.csv",
        }
    }

    /// The mode's sampling parameters.
    pub fn sampling_config(self) -> SamplingConfig {
        match self {
            Mode::Calibration => SamplingConfig::calibration(),
            Mode::Measurement => SamplingConfig::measurement(),
        }
    }
}

/// Accepts the numeric code or the mode name.
impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "calibration" => Ok(Mode::Calibration),
            "measurement" => Ok(Mode::Measurement),
            _ => s
                .parse::<u8>()
                .map_err(|_| ConfigError::UnknownMode(s.to_owned()))
                .and_then(Mode::from_code),
        }
    }
}

/// Collaborators of the sampling loop, handed over at startup.
pub struct Board<S, F, I, D> {
    /// The probes.
    pub sensors: SensorReader,

    /// Filesystem access.
    pub storage: S,

    /// Destination of rows the log file cannot take.
    pub fallback: F,

    /// The status light.
    pub indicator: I,

    /// Blocking delay.
    pub delay: D,
}

/// Bring up the selected mode.
///
/// Flashes the boot color, then makes sure the mode's log file has its
/// header. The returned loop is ready to [`SamplingLoop::run`]; it is already
/// halted if the header could not be written.
///
/// # Arguments
/// * `mode` - The run mode.
/// * `log_dir` - Directory holding the log files.
/// * `board` - The hardware.
///
/// # Returns
/// * `Result<SamplingLoop, StorageError>` - An error when the log file exists
///   but cannot be accessed.
pub fn start<S, F, I, D>(
    mode: Mode,
    log_dir: &Path,
    board: Board<S, F, I, D>,
) -> Result<SamplingLoop<S, F, I, D>, StorageError>
where
    S: Storage,
    F: FallbackSink,
    I: Indicator,
    D: Delay,
{
    let Board {
        sensors,
        storage,
        fallback,
        indicator,
        delay,
    } = board;

    let mut signal = StatusSignal::new(indicator, delay);
    signal.flash(Color::Blue, BOOT_FLASH_MS);

    let path = log_dir.join(mode.log_file_name());
    info!("Starting {mode:?} mode, logging to {}", path.display());

    let store = LogStore::new(path, storage, fallback, ErrorClassTable::standard());
    let mut sampling = SamplingLoop::new(mode.sampling_config(), sensors, store, signal);
    sampling.prepare()?;

    Ok(sampling)
}
