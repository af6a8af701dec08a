use crate::error::SensorError;
use crate::thermistor::Thermistor;
use enumset::EnumSetType;
use log::warn;

/// Analog input channel.
///
/// Declaration order is column order in the log file.
#[derive(Debug, EnumSetType)]
pub enum Channel {
    /// First thermistor probe.
    Temperature1,

    /// Second thermistor probe.
    Temperature2,

    /// Light probe.
    Light,
}

impl Channel {
    /// Header label of the channel's column.
    pub fn column_name(self) -> &'static str {
        match self {
            Channel::Temperature1 => "temperature 1",
            Channel::Temperature2 => "temperature 2",
            Channel::Light => "light",
        }
    }

    fn index(self) -> usize {
        match self {
            Channel::Temperature1 => 0,
            Channel::Temperature2 => 1,
            Channel::Light => 2,
        }
    }
}

/// Source of raw samples in `[0, 65536)`.
pub trait AnalogChannel {
    /// Take one raw sample.
    fn read_raw(&mut self) -> Result<u16, SensorError>;
}

/// Converts raw samples from the three probes into engineering units.
pub struct SensorReader {
    /// Inputs, indexed by channel.
    inputs: [Box<dyn AnalogChannel>; 3],

    /// Thermistor constants.
    thermistor: Thermistor,
}

impl SensorReader {
    /// Create a sensor reader.
    ///
    /// # Arguments
    /// * `temperature1` - First thermistor input.
    /// * `temperature2` - Second thermistor input.
    /// * `light` - Light probe input.
    /// * `thermistor` - Divider and thermistor constants.
    pub fn new(
        temperature1: Box<dyn AnalogChannel>,
        temperature2: Box<dyn AnalogChannel>,
        light: Box<dyn AnalogChannel>,
        thermistor: Thermistor,
    ) -> Self {
        Self {
            inputs: [temperature1, temperature2, light],
            thermistor,
        }
    }

    /// Read a channel as a temperature in Celsius.
    ///
    /// Read failures and zero samples yield `NaN`.
    pub fn read_temperature(&mut self, channel: Channel) -> f64 {
        match self.read_raw(channel) {
            Some(0) => {
                warn!("{channel:?} read zero volts, recording NaN");
                f64::NAN
            }
            Some(raw) => self.thermistor.raw_to_celsius(raw),
            None => f64::NAN,
        }
    }

    /// Read a channel as a voltage. Read failures yield `NaN`.
    pub fn read_light(&mut self, channel: Channel) -> f64 {
        match self.read_raw(channel) {
            Some(raw) => self.thermistor.raw_to_voltage(raw),
            None => f64::NAN,
        }
    }

    /// Read a channel in its natural unit.
    pub fn read(&mut self, channel: Channel) -> f64 {
        match channel {
            Channel::Temperature1 | Channel::Temperature2 => self.read_temperature(channel),
            Channel::Light => self.read_light(channel),
        }
    }

    fn read_raw(&mut self, channel: Channel) -> Option<u16> {
        match self.inputs[channel.index()].read_raw() {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!("{channel:?}: {e}");
                None
            }
        }
    }
}
