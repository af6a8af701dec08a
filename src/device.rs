use crate::error::AppError;
use crate::indicator::StatusPixel;
use crate::sensor::AdcInput;
use crate::storage;
use envlog_core::{Board, ConsoleSink, Delay, FsStorage, SensorReader, Thermistor};
use esp_idf_svc::hal::adc::oneshot::AdcDriver;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use std::path::Path;
use std::rc::Rc;

/// FreeRTOS task delay.
pub struct FreeRtosDelay;

impl Delay for FreeRtosDelay {
  fn delay_ms(&mut self, ms: u32) {
    FreeRtos::delay_ms(ms);
  }
}

/// The board wiring on an ESP32-S3 DevKitC-1:
///
/// | Signal        | Pin    |
/// |---------------|--------|
/// | light         | GPIO1  |
/// | temperature 1 | GPIO2  |
/// | temperature 2 | GPIO3  |
/// | status pixel  | GPIO48 |
pub type DeviceBoard = Board<FsStorage, ConsoleSink, StatusPixel<'static>, FreeRtosDelay>;

/// The device manager interface.
pub struct DeviceManager {
  /// Directory holding the log files.
  pub log_dir: &'static Path,

  /// The hardware handed to the sampling loop.
  pub board: DeviceBoard,
}

/// The device manager implementation.
impl DeviceManager {
  /// Create a new device manager.
  ///
  /// # Parameters
  /// - `peripherals`: The ESP32 peripherals.
  ///
  /// # Returns
  /// The device manager.
  pub fn new(peripherals: Peripherals) -> Result<Self, AppError> {
    let pins = peripherals.pins;

    // Initialize status pixel
    let indicator = StatusPixel::new(peripherals.rmt.channel0, pins.gpio48)?;

    // Initialize analog inputs
    let adc = Rc::new(
      AdcDriver::new(peripherals.adc1)
        .map_err(|e| AppError::AdcError(format!("Failed to initialize ADC1: {:?}", e)))?
    );
    let temperature1 = AdcInput::new(&adc, pins.gpio2, "temperature 1")?;
    let temperature2 = AdcInput::new(&adc, pins.gpio3, "temperature 2")?;
    let light = AdcInput::new(&adc, pins.gpio1, "light")?;

    let sensors = SensorReader::new(
      Box::new(temperature1),
      Box::new(temperature2),
      Box::new(light),
      Thermistor::default(),
    );

    // Mount log partition
    let log_dir = storage::mount()?;

    Ok(Self {
      log_dir,
      board: Board {
        sensors,
        storage: FsStorage,
        fallback: ConsoleSink,
        indicator,
        delay: FreeRtosDelay,
      },
    })
  }
}
