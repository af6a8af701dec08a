use envlog_core::{ConfigError, StorageError};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;
use std::fmt;

/// Application error type.
#[derive(Debug)]
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub enum AppError {
    /// ADC error.
    AdcError(String),

    /// Configuration error.
    ConfigError(String),

    /// Status indicator error.
    IndicatorError(String),

    /// Peripherals error.
    PeripheralsError(String),

    /// Storage error.
    StorageError(String),
}

/// Implement the conversion from `EspError` to `AppError`.
#[cfg(target_os = "espidf")]
impl From<EspError> for AppError {
    /// Convert an `EspError` to an `AppError`.
    ///
    /// # Parameters
    /// - `error`: The ESP-IDF error.
    ///
    /// # Returns
    /// The application error.
    fn from(error: EspError) -> Self {
        AppError::PeripheralsError(format!("ESP-IDF error: {:?}", error))
    }
}

/// Implement the conversion from `ConfigError` to `AppError`.
impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::ConfigError(error.to_string())
    }
}

/// Implement the conversion from `StorageError` to `AppError`.
impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        AppError::StorageError(error.to_string())
    }
}

/// Implement the `Display` trait for `AppError`.
impl fmt::Display for AppError {
    /// Format the error message.
    ///
    /// # Parameters
    /// - `f`: The formatter.
    ///
    /// # Returns
    /// The result of the operation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::AdcError(msg) => write!(f, "ADC error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::IndicatorError(msg) => write!(f, "Indicator error: {}", msg),
            AppError::PeripheralsError(msg) => write!(f, "Peripherals error: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

/// Implement the `Error` trait for `AppError`.
impl std::error::Error for AppError {}
