//! Pochtomat Firmware — Main Entry Point
//!
//! Hexagonal architecture driven by a cooperative scheduler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    NvsAdapter / NvsRegion   FsFileStore       │
//! │  (PIR, servo,       (Config + id region)     (id file)         │
//! │   display, WiFi,    HttpClient               WsSession         │
//! │   clock)            (registration)           (session)         │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MailboxService (pure logic)                 │    │
//! │  │  Pipeline · Dispatcher · Session · Identity            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · Watchdog                        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use pochtomat::adapters::file_store::{self, FsFileStore};
use pochtomat::adapters::hardware::HardwareAdapter;
use pochtomat::adapters::http::HttpClient;
use pochtomat::adapters::log_display::LogDisplay;
use pochtomat::adapters::nvs::NvsAdapter;
use pochtomat::adapters::time::TimeAdapter;
use pochtomat::adapters::wifi::WifiAdapter;
use pochtomat::adapters::ws_session::WsSession;
use pochtomat::app::ports::{ClockPort, ConfigPort};
use pochtomat::app::service::MailboxService;
use pochtomat::config::SystemConfig;
use pochtomat::drivers::hw_init::{self, GpioInput};
use pochtomat::drivers::pir::PirSensor;
use pochtomat::drivers::servo::ServoDriver;
use pochtomat::drivers::watchdog::{self, Watchdog};
use pochtomat::identity::IdentityStore;
use pochtomat::pins;
use pochtomat::scheduler::Scheduler;
use pochtomat::screen;

/// Control loop period.  Task intervals are multiples of this.
const LOOP_SLEEP: Duration = Duration::from_millis(10);

/// Time the failure screen stays up before a restart.
const RESTART_DELAY: Duration = Duration::from_secs(3);

fn restart() -> ! {
    std::thread::sleep(RESTART_DELAY);
    esp_idf_svc::hal::reset::restart()
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Pochtomat v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Identity stores + app service ──────────────────────
    if let Err(e) = file_store::mount() {
        warn!("Identity file unavailable ({}), region copy only", e);
    }
    let identity = IdentityStore::new(nvs.open_region(), FsFileStore::identity());
    let mut service = MailboxService::new(
        config.clone(),
        WsSession::new(),
        HttpClient::new(),
        identity,
    );

    // ── 4. Peripherals ────────────────────────────────────────
    let clock = TimeAdapter::new();
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}, restarting", e);
        // No session exists yet, so the error event is dropped and only
        // the log line and the fatal screen remain.
        let _ = service.report_error(clock.uptime_ms(), clock.epoch_secs());
        let reason = e.to_string();
        screen::fatal(&reason).show(&mut LogDisplay::new());
        restart();
    }
    let mut watchdog = Watchdog::new(watchdog::DEFAULT_TIMEOUT_MS);

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs_partition))?;
    let wifi = WifiAdapter::new(
        BlockingWifi::wrap(esp_wifi, sysloop)?,
        &config.wifi_ssid,
        &config.wifi_password,
    );

    let mut hw = HardwareAdapter::new(
        PirSensor::new(GpioInput::new(pins::PIR_GPIO)),
        ServoDriver::new(config.door_open_angle, config.door_closed_angle),
        LogDisplay::new(),
        wifi,
        clock,
    );

    // ── 5. Boot: splash, door closed, link up ─────────────────
    if let Err(e) = service.boot(&mut hw) {
        error!("Boot failed: {}, restarting", e);
        restart();
    }

    let mut scheduler = Scheduler::from_config(&config);
    info!(
        "System ready ({} tasks). Entering control loop.",
        scheduler.task_count()
    );

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        service.tick(&mut scheduler, &mut hw);
        watchdog.feed();
        std::thread::sleep(LOOP_SLEEP);
    }
}
