use crate::error::AppError;
use envlog_core::{AnalogChannel, SensorError};
use esp_idf_svc::hal::adc::attenuation::DB_11;
use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_svc::hal::adc::ADC1;
use esp_idf_svc::hal::gpio::ADCPin;
use esp_idf_svc::hal::peripheral::Peripheral;
use std::rc::Rc;

/// Resolution of the one-shot ADC.
const ADC_BITS: u32 = 12;

/// Shared ADC1 driver.
pub type Adc1 = Rc<AdcDriver<'static, ADC1>>;

/// One analog input on ADC1.
pub struct AdcInput<T: ADCPin<Adc = ADC1>> {
  /// The channel driver.
  channel: AdcChannelDriver<'static, T, Adc1>,

  /// Label used in log messages.
  label: &'static str,
}

/// The ADC input implementation.
impl<T: ADCPin<Adc = ADC1>> AdcInput<T> {
  /// Create a new ADC input.
  ///
  /// # Parameters
  /// - `adc`: The shared ADC1 driver.
  /// - `pin`: The analog pin.
  /// - `label`: Label used in log messages.
  ///
  /// # Returns
  /// The ADC input.
  pub fn new(
    adc: &Adc1,
    pin: impl Peripheral<P = T> + 'static,
    label: &'static str,
  ) -> Result<Self, AppError> {
    let config = AdcChannelConfig {
      attenuation: DB_11,
      ..Default::default()
    };

    let channel = AdcChannelDriver::new(Rc::clone(adc), pin, &config)
      .map_err(|e| AppError::AdcError(format!("Failed to configure {}: {:?}", label, e)))?;

    Ok(Self { channel, label })
  }
}

/// Raw readings are scaled to the 16-bit range the transfer functions expect.
impl<T: ADCPin<Adc = ADC1>> AnalogChannel for AdcInput<T> {
  fn read_raw(&mut self) -> Result<u16, SensorError> {
    let raw = self.channel.read_raw()
      .map_err(|e| SensorError::Read(format!("{}: {:?}", self.label, e)))?;

    Ok(raw << (16 - ADC_BITS))
  }
}
