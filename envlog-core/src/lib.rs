//! Hardware-independent core of the plant environment logger.
//!
//! Samples two thermistors and a light probe, averages the readings and
//! appends them to a comma-separated log file. Storage failures are reported
//! on a single status light.

pub mod error;
pub mod indicator;
pub mod mode;
pub mod row;
pub mod sampling;
pub mod sensor;
pub mod store;
pub mod thermistor;

pub use error::{ConfigError, SensorError, StorageError, StorageErrorClass};
pub use indicator::{BlinkPattern, Color, Delay, ErrorClassTable, Indicator, StatusSignal};
pub use mode::{start, Board, Mode};
pub use row::{Field, Row};
pub use sampling::{DeviceState, RestartFlag, SamplingConfig, SamplingLoop};
pub use sensor::{AnalogChannel, Channel, SensorReader};
pub use store::{ConsoleSink, Delivery, FallbackSink, FsStorage, LogStore, Storage};
pub use thermistor::Thermistor;
