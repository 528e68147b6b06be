//! System configuration parameters
//!
//! All tunable parameters for the Pochtomat mailbox.
//! Values can be overridden via NVS (non-volatile storage); the defaults
//! below are what a factory-fresh device runs with.

use serde::{Deserialize, Serialize};

/// How a motion-triggered door opening is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    /// Drive the servo directly from the pipeline.
    Local,
    /// Ask the backend to open via `{"type":"command","command":"open"}`.
    ViaBackend,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Network link ---
    /// Station SSID; empty means "not provisioned"
    pub wifi_ssid: heapless::String<32>,
    /// Station password; empty for open networks
    pub wifi_password: heapless::String<64>,

    // --- Backend ---
    /// Registration endpoint (HTTP POST, 201 on success)
    pub registration_url: heapless::String<128>,
    /// Persistent session endpoint (WebSocket)
    pub session_url: heapless::String<128>,
    /// Pre-shared secret sent as `secretWord` during registration
    pub registration_secret: heapless::String<64>,

    // --- Motion ---
    /// Sensor poll interval (milliseconds)
    pub motion_poll_interval_ms: u32,
    /// Minimum gap between two `new_mail` events (milliseconds)
    pub mail_cooldown_ms: u32,
    /// Door opening strategy on new mail
    pub open_mode: OpenMode,

    // --- Door servo ---
    /// Servo angle for the open door (degrees)
    pub door_open_angle: u8,
    /// Servo angle for the closed door (degrees)
    pub door_closed_angle: u8,

    // --- Session ---
    /// Session maintenance (connect / heartbeat check) interval (milliseconds)
    pub session_maintain_interval_ms: u32,
    /// Liveness probe interval (milliseconds)
    pub heartbeat_interval_ms: u32,
    /// Silence after which the session is declared dead (milliseconds)
    pub heartbeat_dead_after_ms: u32,
    /// Flat delay between reconnect attempts (milliseconds)
    pub reconnect_interval_ms: u32,

    // --- Registration ---
    /// Retry cadence for registration while identity is unset (milliseconds)
    pub registration_retry_ms: u32,
    /// Upper bound for one registration / connect request (milliseconds)
    pub request_timeout_ms: u32,

    // --- Housekeeping ---
    /// Wall-clock resync interval (milliseconds)
    pub clock_sync_interval_ms: u32,
    /// Display refresh interval (milliseconds)
    pub display_refresh_interval_ms: u32,
}

fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    // Defaults are compile-time literals well under capacity.
    let _ = out.push_str(s);
    out
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network link
            wifi_ssid: heapless::String::new(),
            wifi_password: heapless::String::new(),

            // Backend
            registration_url: fixed("https://your-backend.com/api/register"),
            session_url: fixed("wss://your-backend.com/ws"),
            registration_secret: fixed("change-me"),

            // Motion
            motion_poll_interval_ms: 100, // 10 Hz
            mail_cooldown_ms: 10_000,
            open_mode: OpenMode::Local,

            // Door servo
            door_open_angle: 90,
            door_closed_angle: 0,

            // Session
            session_maintain_interval_ms: 100,
            heartbeat_interval_ms: 30_000,
            heartbeat_dead_after_ms: 60_000, // 2x heartbeat
            reconnect_interval_ms: 5_000,

            // Registration
            registration_retry_ms: 1_000,
            request_timeout_ms: 5_000,

            // Housekeeping
            clock_sync_interval_ms: 60_000,
            display_refresh_interval_ms: 2_000,
        }
    }
}
