#[cfg(target_os = "espidf")]
mod device;
mod error;
#[cfg(target_os = "espidf")]
mod indicator;
#[cfg(target_os = "espidf")]
mod sensor;
#[cfg(not(target_os = "espidf"))]
mod sim;
#[cfg(target_os = "espidf")]
mod storage;

use crate::error::AppError;
use envlog_core::{Board, ConsoleSink, Delay, FsStorage, Indicator, Mode};
use log::{error, info};
use std::path::Path;

/// Run mode, chosen at build time: `1`/`calibration` or `2`/`measurement`.
const RUN_MODE: &str = match option_env!("ENVLOG_RUN_MODE") {
  Some(mode) => mode,
  None => "1",
};

/// This function initializes the system and starts the sampling loop.
///
/// # Returns
/// Only on a startup error; the sampling loop never returns.
fn main() -> Result<(), AppError> {
  init_logging();
  info!("Starting the plant environment logger...");

  let mode: Mode = RUN_MODE.parse().map_err(|e| {
    error!("{}", e);
    AppError::from(e)
  })?;

  let (log_dir, board) = take_board()?;

  let sampling = envlog_core::start(mode, log_dir, board).map_err(|e| {
    error!("{}", e);
    AppError::from(e)
  })?;

  sampling.run()
}

#[cfg(target_os = "espidf")]
fn init_logging() {
  esp_idf_svc::sys::link_patches();
  esp_idf_svc::log::EspLogger::initialize_default();
}

#[cfg(not(target_os = "espidf"))]
fn init_logging() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Bring up the device hardware.
#[cfg(target_os = "espidf")]
fn take_board() -> Result<(&'static Path, Board<FsStorage, ConsoleSink, impl Indicator, impl Delay>), AppError> {
  use esp_idf_svc::hal::peripherals::Peripherals;

  let peripherals = Peripherals::take()
    .map_err(|_| AppError::PeripheralsError("Failed to acquire ESP32 peripherals".into()))?;

  let manager = device::DeviceManager::new(peripherals)?;

  Ok((manager.log_dir, manager.board))
}

/// Stand in for the hardware on a development host.
#[cfg(not(target_os = "espidf"))]
fn take_board() -> Result<(&'static Path, Board<FsStorage, ConsoleSink, impl Indicator, impl Delay>), AppError> {
  info!("No device hardware on this target, using the simulated board");

  Ok(sim::board())
}
