//! Append-only log file with degraded-mode handling of write failures.
//!
//! A failed append is classified: a read-only filesystem diverts the row to a
//! fallback sink and lets sampling continue, every other failure is returned
//! to the caller, which halts the device.

use crate::error::{StorageError, StorageErrorClass};
use crate::indicator::{
    BlinkPattern, Color, Delay, ErrorClassTable, Indicator, StatusSignal, SUCCESS_FLASH_MS,
};
use crate::row::Row;
use log::{error, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Filesystem seam.
pub trait Storage {
    /// True iff `path` names a readable file. Absence is `Ok(false)`; every
    /// other failure is an error.
    fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Append `line` to `path` in a single write, creating the file if needed.
    fn append_line(&mut self, path: &Path, line: &str) -> io::Result<()>;
}

/// `std::fs` backed storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl Storage for FsStorage {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        if !file.metadata()?.is_file() {
            return Err(io::Error::other(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        Ok(true)
    }

    fn append_line(&mut self, path: &Path, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

/// Best-effort destination for rows the log file could not take.
pub trait FallbackSink {
    /// Emit one serialized row, newline excluded.
    fn emit(&mut self, line: &str);
}

/// Prints diverted rows on the console.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

/// A console that cannot be written is logged, never fatal.
impl FallbackSink for ConsoleSink {
    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(io::stdout().lock(), "{line}") {
            warn!("Console unavailable, row lost: {line} ({e})");
        }
    }
}

/// Where an appended row ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the log file.
    Written,

    /// The filesystem is read-only; the row went to the fallback sink.
    Diverted,
}

/// Owner of one log file.
pub struct LogStore<S, F> {
    path: PathBuf,
    storage: S,
    fallback: F,
    errors: ErrorClassTable,
}

impl<S: Storage, F: FallbackSink> LogStore<S, F> {
    /// Create a log store.
    ///
    /// # Arguments
    /// * `path` - The log file.
    /// * `storage` - Filesystem access.
    /// * `fallback` - Sink for rows diverted from a read-only filesystem.
    /// * `errors` - Blink patterns per error class.
    pub fn new(path: impl Into<PathBuf>, storage: S, fallback: F, errors: ErrorClassTable) -> Self {
        Self {
            path: path.into(),
            storage,
            fallback,
            errors,
        }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the log file exists.
    ///
    /// # Returns
    /// * `Result<bool, StorageError>` - `false` only when the file is absent.
    pub fn exists(&self) -> Result<bool, StorageError> {
        self.storage
            .exists(&self.path)
            .map_err(|source| StorageError::Inaccessible {
                path: self.path.clone(),
                source,
            })
    }

    /// Write `header` as the first line if the log file does not exist yet.
    ///
    /// # Returns
    /// * `Result<Option<Delivery>, StorageError>` - `None` when the file was
    ///   already there.
    pub fn ensure_header<I: Indicator, D: Delay>(
        &mut self,
        header: &Row,
        signal: &mut StatusSignal<I, D>,
    ) -> Result<Option<Delivery>, StorageError> {
        if self.exists()? {
            return Ok(None);
        }

        info!("Creating {} with header: {header}", self.path.display());
        self.append(header, signal).map(Some)
    }

    /// Append a row.
    ///
    /// On success the indicator flashes green. A read-only filesystem diverts
    /// the row to the fallback sink with one short blink of its pattern. Any
    /// other failure is returned; the caller must stop writing.
    pub fn append<I: Indicator, D: Delay>(
        &mut self,
        row: &Row,
        signal: &mut StatusSignal<I, D>,
    ) -> Result<Delivery, StorageError> {
        match self.storage.append_line(&self.path, &row.to_line()) {
            Ok(()) => {
                signal.flash(Color::Green, SUCCESS_FLASH_MS);
                Ok(Delivery::Written)
            }
            Err(source) => {
                let err = StorageError::write(self.path.clone(), source);
                error!("{err}");

                if err.class() != StorageErrorClass::ReadOnlyFilesystem {
                    return Err(err);
                }

                warn!("Diverting row to console: {row}");
                self.fallback.emit(&row.to_string());
                signal.blink_once(self.errors.pattern(err.class()));
                Ok(Delivery::Diverted)
            }
        }
    }

    /// Blink pattern for an error.
    pub fn pattern_for(&self, err: &StorageError) -> BlinkPattern {
        self.errors.pattern(err.class())
    }
}
