//! Flat-file store on the flash filesystem.
//!
//! Implements [`FileStore`] over `std::fs`.  On ESP-IDF the SPIFFS
//! partition is mounted at [`MOUNT_POINT`] by [`mount`] before any file is
//! touched; on the host the path is an ordinary file, which is what the
//! tests point at a temp directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::app::ports::FileStore;
use crate::error::StorageError;

/// VFS path the SPIFFS partition is mounted under.
pub const MOUNT_POINT: &str = "/spiffs";

/// File name of the identity copy inside [`MOUNT_POINT`].
pub const IDENTITY_FILE: &str = "device_id.txt";

/// Mount the SPIFFS partition, formatting it if the mount fails.
#[cfg(target_os = "espidf")]
pub fn mount() -> Result<(), StorageError> {
    use esp_idf_svc::sys::{esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, ESP_OK};

    let conf = esp_vfs_spiffs_conf_t {
        base_path: c"/spiffs".as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: conf outlives the call; ESP-IDF copies what it keeps.
    let ret = unsafe { esp_vfs_spiffs_register(&conf) };
    if ret != ESP_OK as i32 {
        warn!("FileStore: SPIFFS mount failed (rc={})", ret);
        return Err(StorageError::IoError);
    }
    log::info!("FileStore: SPIFFS mounted at {}", MOUNT_POINT);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn mount() -> Result<(), StorageError> {
    debug!("FileStore(sim): mount skipped");
    Ok(())
}

pub struct FsFileStore {
    path: PathBuf,
}

impl FsFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The identity file under the default mount point.
    pub fn identity() -> Self {
        Self::new(Path::new(MOUNT_POINT).join(IDENTITY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn map_io(e: &std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::IoError,
    }
}

impl FileStore for FsFileStore {
    fn read_to_string(&self) -> Result<String, StorageError> {
        std::fs::read_to_string(&self.path).map_err(|e| {
            let err = map_io(&e);
            if err != StorageError::NotFound {
                warn!("FileStore: read {} failed ({})", self.path.display(), e);
            }
            err
        })
    }

    fn write_all(&mut self, contents: &str) -> Result<(), StorageError> {
        std::fs::write(&self.path, contents).map_err(|e| {
            warn!("FileStore: write {} failed ({})", self.path.display(), e);
            map_io(&e)
        })?;
        debug!("FileStore: wrote {} bytes to {}", contents.len(), self.path.display());
        Ok(())
    }
}
