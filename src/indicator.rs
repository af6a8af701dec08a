use crate::error::AppError;
use envlog_core::{Color, Indicator};
use esp_idf_svc::hal::gpio::OutputPin;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::rmt::config::TransmitConfig;
use esp_idf_svc::hal::rmt::{FixedLengthSignal, PinState, Pulse, RmtChannel, TxRmtDriver};
use esp_idf_svc::sys::EspError;
use log::warn;
use std::time::Duration;

/// Brightness in percent of full scale.
const BRIGHTNESS_PERCENT: u16 = 10;

/// WS2812 bit timings in nanoseconds: (high, low) for a 0 bit and a 1 bit.
const T0: (u64, u64) = (350, 800);
const T1: (u64, u64) = (700, 600);

/// Onboard WS2812 status pixel.
pub struct StatusPixel<'a> {
  /// The RMT transmitter.
  tx: TxRmtDriver<'a>,
}

/// The status pixel implementation.
impl<'a> StatusPixel<'a> {
  /// Create a new status pixel.
  ///
  /// # Parameters
  /// - `channel`: The RMT channel.
  /// - `pin`: The data pin of the pixel.
  ///
  /// # Returns
  /// The status pixel, switched off.
  pub fn new<C: RmtChannel>(
    channel: impl Peripheral<P = C> + 'a,
    pin: impl Peripheral<P = impl OutputPin> + 'a,
  ) -> Result<Self, AppError> {
    let config = TransmitConfig::new().clock_divider(1);
    let tx = TxRmtDriver::new(channel, pin, &config)
      .map_err(|e| AppError::IndicatorError(format!("Failed to initialize RMT: {:?}", e)))?;

    let mut pixel = Self { tx };
    pixel.write([0, 0, 0])
      .map_err(|e| AppError::IndicatorError(format!("Failed to clear pixel: {:?}", e)))?;

    Ok(pixel)
  }

  /// Send one color frame.
  ///
  /// # Parameters
  /// - `rgb`: The color, already scaled.
  ///
  /// # Returns
  /// The result of the operation.
  fn write(&mut self, rgb: [u8; 3]) -> Result<(), EspError> {
    let ticks_hz = self.tx.counter_clock()?;
    let pulse = |level, ns| Pulse::new_with_duration(ticks_hz, level, &Duration::from_nanos(ns));
    let zero = (pulse(PinState::High, T0.0)?, pulse(PinState::Low, T0.1)?);
    let one = (pulse(PinState::High, T1.0)?, pulse(PinState::Low, T1.1)?);

    // The pixel expects GRB, most significant bit first.
    let [r, g, b] = rgb;
    let frame = (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b);

    let mut signal = FixedLengthSignal::<24>::new();
    for i in 0..24 {
      let bit = frame & (1 << (23 - i)) != 0;
      signal.set(i, if bit { &one } else { &zero })?;
    }

    self.tx.start_blocking(&signal)
  }
}

/// Failures are logged: the pixel is diagnostic only.
impl Indicator for StatusPixel<'_> {
  fn set(&mut self, color: Color) {
    let rgb = color.rgb().map(|c| (u16::from(c) * BRIGHTNESS_PERCENT / 100) as u8);

    if let Err(e) = self.write(rgb) {
      warn!("Failed to set status pixel to {:?}: {:?}", color, e);
    }
  }
}
