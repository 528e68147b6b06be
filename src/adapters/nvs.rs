//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the system configuration blob and
//! [`RegionStore`] for the fixed-layout identity region.
//!
//! - Config validation: all fields are range-checked before persistence.
//! - The region is an EEPROM-style byte array: reads and writes hit a RAM
//!   mirror loaded at open time, [`RegionStore::commit`] writes the whole
//!   mirror back as one NVS blob.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.

use super::utils::is_printable_ascii;
use crate::app::ports::{ConfigError, ConfigPort, RegionStore};
use crate::config::SystemConfig;
use crate::error::StorageError;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "pochtomat";
#[cfg(not(target_os = "espidf"))]
const CONFIG_KEY: &str = "syscfg";
#[cfg(not(target_os = "espidf"))]
const REGION_KEY: &str = "idregion";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

/// Bytes reserved for the identity region.
pub const REGION_SIZE: usize = 64;

// ───────────────────────────────────────────────────────────────
// NvsAdapter (config)
// ───────────────────────────────────────────────────────────────

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Open the identity region backed by this NVS partition.
    pub fn open_region(&self) -> NvsRegion<'_> {
        NvsRegion::open(self)
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(key: &str) -> String {
        format!("{}::{}", CONFIG_NAMESPACE, key)
    }

    #[cfg(not(target_os = "espidf"))]
    fn get_blob(&self, key: &str) -> Option<Vec<u8>> {
        self.store.borrow().get(&Self::composite_key(key)).cloned()
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_blob(&self, key: &str, bytes: &[u8]) -> Result<(), i32> {
        self.store
            .borrow_mut()
            .insert(Self::composite_key(key), bytes.to_vec());
        Ok(())
    }

    /// Read a whole blob.  `Ok(None)` when the key does not exist.
    #[cfg(target_os = "espidf")]
    fn get_blob_raw(key_cstr: &[u8]) -> Result<Option<Vec<u8>>, i32> {
        let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
            let mut size: usize = 0;

            // First call: get size
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    core::ptr::null_mut(),
                    &mut size,
                )
            };
            if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                return Err(ret);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(buf)
        });
        match result {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[cfg(target_os = "espidf")]
    fn set_blob_raw(key_cstr: &[u8], bytes: &[u8]) -> Result<(), i32> {
        Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_cstr.as_ptr() as *const _,
                    bytes.as_ptr() as *const _,
                    bytes.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns_bytes = namespace.as_bytes();
        let len = ns_bytes.len().min(15);
        ns_buf[..len].copy_from_slice(&ns_bytes[..len]);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !is_printable_ascii(&cfg.wifi_ssid) {
        return Err(ConfigError::ValidationFailed(
            "wifi_ssid must be printable ASCII",
        ));
    }
    if !cfg.wifi_password.is_empty() && cfg.wifi_password.len() < 8 {
        return Err(ConfigError::ValidationFailed(
            "wifi_password must be empty or 8–64 bytes",
        ));
    }
    if cfg.registration_url.is_empty() || cfg.session_url.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "backend URLs must not be empty",
        ));
    }
    if !(10..=1000).contains(&cfg.motion_poll_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "motion_poll_interval_ms must be 10–1000",
        ));
    }
    if cfg.mail_cooldown_ms < cfg.motion_poll_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "mail_cooldown_ms must be >= motion_poll_interval_ms",
        ));
    }
    if cfg.door_open_angle > 180 || cfg.door_closed_angle > 180 {
        return Err(ConfigError::ValidationFailed("door angles must be 0–180"));
    }
    if !(1_000..=300_000).contains(&cfg.heartbeat_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "heartbeat_interval_ms must be 1000–300000",
        ));
    }
    if cfg.heartbeat_dead_after_ms <= cfg.heartbeat_interval_ms {
        return Err(ConfigError::ValidationFailed(
            "heartbeat_dead_after_ms must be > heartbeat_interval_ms",
        ));
    }
    if !(100..=60_000).contains(&cfg.reconnect_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "reconnect_interval_ms must be 100–60000",
        ));
    }
    if !(500..=30_000).contains(&cfg.request_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "request_timeout_ms must be 500–30000",
        ));
    }
    if cfg.registration_retry_ms == 0
        || cfg.session_maintain_interval_ms == 0
        || cfg.clock_sync_interval_ms == 0
        || cfg.display_refresh_interval_ms == 0
    {
        return Err(ConfigError::ValidationFailed(
            "task intervals must be non-zero",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        let stored = self.get_blob(CONFIG_KEY);

        #[cfg(target_os = "espidf")]
        let stored = match Self::get_blob_raw(b"syscfg\0") {
            Ok(s) => s,
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}, using defaults", e);
                None
            }
        };

        match stored {
            Some(bytes) => {
                let cfg: SystemConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            None => {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(SystemConfig::default())
            }
        }
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        let result = self.set_blob(CONFIG_KEY, &bytes);

        #[cfg(target_os = "espidf")]
        let result = Self::set_blob_raw(b"syscfg\0", &bytes);

        match result {
            Ok(()) => {
                info!("NvsAdapter: config saved ({} bytes)", bytes.len());
                Ok(())
            }
            Err(e) => {
                warn!("NvsAdapter: NVS write error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }
}

impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }
}

// ───────────────────────────────────────────────────────────────
// NvsRegion (identity region)
// ───────────────────────────────────────────────────────────────

/// EEPROM-style byte region persisted as a single NVS blob.
pub struct NvsRegion<'a> {
    #[cfg_attr(target_os = "espidf", allow(dead_code))]
    nvs: &'a NvsAdapter,
    mirror: [u8; REGION_SIZE],
    /// Set when the initial load failed; reads report it until a commit
    /// succeeds.
    load_failed: bool,
}

impl<'a> NvsRegion<'a> {
    fn open(nvs: &'a NvsAdapter) -> Self {
        let mut mirror = [0xFF; REGION_SIZE];

        #[cfg(not(target_os = "espidf"))]
        let stored: Result<Option<Vec<u8>>, i32> = Ok(nvs.get_blob(REGION_KEY));

        #[cfg(target_os = "espidf")]
        let stored = NvsAdapter::get_blob_raw(b"idregion\0");

        let load_failed = match stored {
            Ok(Some(bytes)) => {
                let n = bytes.len().min(REGION_SIZE);
                mirror[..n].copy_from_slice(&bytes[..n]);
                false
            }
            Ok(None) => false,
            Err(e) => {
                warn!("NvsRegion: read error {}", e);
                true
            }
        };

        Self {
            nvs,
            mirror,
            load_failed,
        }
    }
}

impl RegionStore for NvsRegion<'_> {
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        if self.load_failed {
            return Err(StorageError::IoError);
        }
        let src = self
            .mirror
            .get(offset..offset + buf.len())
            .ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let dst = self
            .mirror
            .get_mut(offset..offset + data.len())
            .ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        let result = self.nvs.set_blob(REGION_KEY, &self.mirror);

        #[cfg(target_os = "espidf")]
        let result = NvsAdapter::set_blob_raw(b"idregion\0", &self.mirror);

        match result {
            Ok(()) => {
                self.load_failed = false;
                Ok(())
            }
            Err(e) => {
                warn!("NvsRegion: commit failed ({})", e);
                Err(StorageError::IoError)
            }
        }
    }
}
