//! ESP32 time adapter.
//!
//! Implements [`ClockPort`]: monotonic uptime plus SNTP-backed wall time.
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`
//!   (microsecond precision, monotonic); wall time from the system clock,
//!   kept in sync by `EspSntp`.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for uptime and
//!   the host clock for wall time.

use std::time::{SystemTime, UNIX_EPOCH};

use log::info;

use crate::app::ports::ClockPort;

/// Anything before 2020-01-01 means SNTP has not run yet.
const EPOCH_2020: u64 = 1_577_836_800;

pub struct TimeAdapter {
    #[cfg(target_os = "espidf")]
    sntp: Option<esp_idf_svc::sntp::EspSntp<'static>>,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    synced: bool,
}

impl Default for TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(target_os = "espidf")]
            sntp: None,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            synced: false,
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_resync(&mut self) -> bool {
        use esp_idf_svc::sntp::{EspSntp, SyncStatus};

        if self.sntp.is_none() {
            match EspSntp::new_default() {
                Ok(s) => {
                    info!("Time: SNTP started (pool.ntp.org)");
                    self.sntp = Some(s);
                }
                Err(e) => {
                    log::warn!("Time: SNTP start failed ({})", e);
                    return false;
                }
            }
        }
        let completed = self
            .sntp
            .as_ref()
            .is_some_and(|s| s.get_sync_status() == SyncStatus::Completed);
        completed || self.epoch_secs() >= EPOCH_2020
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_resync(&mut self) -> bool {
        self.epoch_secs() >= EPOCH_2020
    }
}

impl ClockPort for TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a read of the RTC-backed counter.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn epoch_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn resync(&mut self) -> bool {
        let ok = self.platform_resync();
        if ok && !self.synced {
            info!("Time: wall clock synced (epoch {})", self.epoch_secs());
        }
        self.synced |= ok;
        ok
    }
}
