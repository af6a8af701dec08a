//! Desktop stand-in for the board, for dry runs of the firmware.

use envlog_core::{
  AnalogChannel, Board, Color, ConsoleSink, Delay, FsStorage, Indicator, SensorError, SensorReader,
  Thermistor,
};
use log::debug;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Log files go to the working directory.
pub const LOG_DIR: &str = ".";

/// Analog input drifting in a slow triangle around a center value.
pub struct DriftingInput {
  /// Center of the drift.
  center: u16,

  /// Half-width of the drift.
  span: u16,

  /// Samples taken so far.
  tick: u32,
}

impl DriftingInput {
  pub fn new(center: u16, span: u16) -> Self {
    Self { center, span, tick: 0 }
  }
}

impl AnalogChannel for DriftingInput {
  fn read_raw(&mut self) -> Result<u16, SensorError> {
    let period = 4 * u32::from(self.span.max(1));
    let phase = self.tick % period;
    let offset = i64::from(phase.min(period - phase)) - i64::from(self.span);
    self.tick = self.tick.wrapping_add(1);

    let raw = (i64::from(self.center) + offset).clamp(0, i64::from(u16::MAX));
    Ok(raw as u16)
  }
}

/// Indicator that logs color changes.
pub struct LoggedIndicator;

impl Indicator for LoggedIndicator {
  fn set(&mut self, color: Color) {
    debug!("indicator: {:?}", color);
  }
}

/// Thread sleep.
pub struct ThreadDelay;

impl Delay for ThreadDelay {
  fn delay_ms(&mut self, ms: u32) {
    thread::sleep(Duration::from_millis(u64::from(ms)));
  }
}

/// The simulated board.
pub type SimBoard = Board<FsStorage, ConsoleSink, LoggedIndicator, ThreadDelay>;

/// Build the simulated board.
///
/// # Returns
/// The log directory and the board.
pub fn board() -> (&'static Path, SimBoard) {
  let sensors = SensorReader::new(
    Box::new(DriftingInput::new(30_500, 400)),
    Box::new(DriftingInput::new(29_200, 300)),
    Box::new(DriftingInput::new(18_000, 2_000)),
    Thermistor::default(),
  );

  let board = Board {
    sensors,
    storage: FsStorage,
    fallback: ConsoleSink,
    indicator: LoggedIndicator,
    delay: ThreadDelay,
  };

  (Path::new(LOG_DIR), board)
}

