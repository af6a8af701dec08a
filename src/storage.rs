use crate::error::AppError;
use esp_idf_svc::sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};
use log::info;
use std::path::Path;

/// Mount point of the log partition.
pub const LOG_DIR: &str = "/storage";

/// Maximum number of files open at once on the log partition.
const MAX_OPEN_FILES: usize = 4;

/// Mount the SPIFFS partition that holds the log files.
///
/// # Returns
/// The directory to place the log files in.
pub fn mount() -> Result<&'static Path, AppError> {
  let config = esp_vfs_spiffs_conf_t {
    base_path: c"/storage".as_ptr(),
    partition_label: std::ptr::null(),
    max_files: MAX_OPEN_FILES,
    format_if_mount_failed: true,
  };

  // SAFETY: the configuration strings are 'static and the registration
  // copies what it keeps.
  esp!(unsafe { esp_vfs_spiffs_register(&config) })
    .map_err(|e| AppError::StorageError(format!("Failed to mount {}: {:?}", LOG_DIR, e)))?;

  info!("Mounted log partition at {}", LOG_DIR);

  Ok(Path::new(LOG_DIR))
}
