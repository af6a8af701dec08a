//! Transfer functions from raw ADC counts to engineering units.
//!
//! The temperature probes are NTC thermistors between the reference voltage
//! and the ADC pin, with a fixed resistor from the pin to ground. The light
//! probe is read as a plain voltage.

/// Exclusive upper bound of a raw ADC sample (16-bit range).
pub const MAX_RAW: f64 = 65536.0;

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Divider and thermistor constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thermistor {
    /// Reference voltage of the ADC and the divider, in volts.
    pub vref: f64,

    /// Fixed divider resistor, in ohms.
    pub r_fixed: f64,

    /// Beta material constant, in kelvin.
    pub beta: f64,

    /// Nominal resistance at `t0_kelvin`, in ohms.
    pub r0: f64,

    /// Nominal temperature, in kelvin.
    pub t0_kelvin: f64,
}

impl Default for Thermistor {
    fn default() -> Self {
        Self {
            vref: 3.3,
            r_fixed: 10_500.0,
            beta: 3470.0,
            r0: 10_000.0,
            t0_kelvin: 298.15,
        }
    }
}

impl Thermistor {
    /// Convert a raw sample to volts.
    pub fn raw_to_voltage(&self, raw: u16) -> f64 {
        f64::from(raw) * self.vref / MAX_RAW
    }

    /// Convert a raw sample to the thermistor resistance.
    ///
    /// # Arguments
    /// * `raw` - The raw ADC sample.
    ///
    /// # Returns
    /// * `Option<f64>` - The resistance in ohms, or `None` when the sample is
    ///   zero and the divider equation has no solution.
    pub fn raw_to_resistance(&self, raw: u16) -> Option<f64> {
        if raw == 0 {
            return None;
        }

        let voltage = self.raw_to_voltage(raw);
        Some(self.r_fixed * (self.vref / voltage - 1.0))
    }

    /// Beta equation: resistance in ohms to temperature in Celsius.
    pub fn resistance_to_celsius(&self, resistance: f64) -> f64 {
        let inv_kelvin = 1.0 / self.t0_kelvin + (resistance / self.r0).ln() / self.beta;
        1.0 / inv_kelvin - KELVIN_OFFSET
    }

    /// Inverse of [`Thermistor::resistance_to_celsius`].
    pub fn celsius_to_resistance(&self, celsius: f64) -> f64 {
        let kelvin = celsius + KELVIN_OFFSET;
        self.r0 * (self.beta * (1.0 / kelvin - 1.0 / self.t0_kelvin)).exp()
    }

    /// Convert a raw sample to a temperature in Celsius.
    ///
    /// A zero sample yields `NaN`: it carries no temperature information and
    /// the averaged row then shows the gap instead of a made-up value.
    pub fn raw_to_celsius(&self, raw: u16) -> f64 {
        match self.raw_to_resistance(raw) {
            Some(resistance) => self.resistance_to_celsius(resistance),
            None => f64::NAN,
        }
    }
}
