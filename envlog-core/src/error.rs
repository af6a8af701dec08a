use std::io;
use std::path::PathBuf;

/// Errno for "no space left on device".
pub const ENOSPC: i32 = 28;

/// Errno for "read-only file system".
pub const EROFS: i32 = 30;

/// Storage error category, used to pick the escalation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorClass {
    /// The filesystem is mounted read-only.
    ReadOnlyFilesystem,

    /// The filesystem has no space left.
    OutOfSpace,

    /// Anything else.
    Other,
}

impl StorageErrorClass {
    /// Classify an I/O error.
    ///
    /// # Arguments
    /// * `error` - The error returned by the filesystem.
    ///
    /// # Returns
    /// * `StorageErrorClass` - The category of the error.
    pub fn of(error: &io::Error) -> Self {
        match (error.kind(), error.raw_os_error()) {
            (io::ErrorKind::ReadOnlyFilesystem, _) | (_, Some(EROFS)) => Self::ReadOnlyFilesystem,
            (io::ErrorKind::StorageFull, _) | (_, Some(ENOSPC)) => Self::OutOfSpace,
            _ => Self::Other,
        }
    }
}

/// Implementation of the `Display` trait for StorageErrorClass.
impl core::fmt::Display for StorageErrorClass {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `core::fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageErrorClass::ReadOnlyFilesystem => write!(f, "read-only filesystem"),
            StorageErrorClass::OutOfSpace => write!(f, "out of space"),
            StorageErrorClass::Other => write!(f, "unclassified storage error"),
        }
    }
}

/// Storage error.
#[derive(Debug)]
pub enum StorageError {
    /// The log file exists but could not be opened for reading.
    Inaccessible { path: PathBuf, source: io::Error },

    /// Appending a row failed.
    Write {
        path: PathBuf,
        class: StorageErrorClass,
        source: io::Error,
    },
}

impl StorageError {
    /// Build a write error, classifying the underlying I/O error.
    pub fn write(path: PathBuf, source: io::Error) -> Self {
        let class = StorageErrorClass::of(&source);
        StorageError::Write {
            path,
            class,
            source,
        }
    }

    /// The error category. Existence-check failures count as unclassified.
    pub fn class(&self) -> StorageErrorClass {
        match self {
            StorageError::Inaccessible { .. } => StorageErrorClass::Other,
            StorageError::Write { class, .. } => *class,
        }
    }
}

/// Implementation of the `Display` trait for StorageError.
impl core::fmt::Display for StorageError {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `core::fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StorageError::Inaccessible { path, source } => {
                write!(f, "Cannot access {}: {source}", path.display())
            }
            StorageError::Write {
                path,
                class,
                source,
            } => write!(f, "Error writing {} ({class}): {source}", path.display()),
        }
    }
}

/// Implementation of the `Error` trait for StorageError.
impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Inaccessible { source, .. } | StorageError::Write { source, .. } => {
                Some(source)
            }
        }
    }
}

/// Sensor error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// The analog channel could not be read.
    Read(String),
}

/// Implementation of the `Display` trait for SensorError.
impl core::fmt::Display for SensorError {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `core::fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SensorError::Read(msg) => write!(f, "Analog read failed: {msg}"),
        }
    }
}

/// Implementation of the `Error` trait for SensorError.
impl std::error::Error for SensorError {}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The run mode value names no known mode.
    UnknownMode(String),
}

/// Implementation of the `Display` trait for ConfigError.
impl core::fmt::Display for ConfigError {
    /// Format the error message.
    ///
    /// # Arguments
    /// * `f` - The formatter to write the error message to.
    ///
    /// # Returns
    /// * `core::fmt::Result` - The result of the formatting operation.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::UnknownMode(mode) => write!(f, "Mode {mode} does not exist"),
        }
    }
}

/// Implementation of the `Error` trait for ConfigError.
impl std::error::Error for ConfigError {}
