//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MailboxService (domain)
//! ```
//!
//! Driven adapters (PIR, servo, display, WiFi, clock, storage, network
//! clients) implement these traits.  The [`MailboxService`](super::service::MailboxService)
//! consumes them via generics, so the domain core never touches hardware
//! or sockets directly.
//!
//! Every port that performs I/O is bounded: HTTP and session connects take
//! an explicit timeout, session polling never blocks.

use crate::config::SystemConfig;
use crate::error::{SessionError, StorageError};
use crate::scheduler::TaskId;

// ───────────────────────────────────────────────────────────────
// Peripheral ports (driven adapters: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// PIR motion sensor.
pub trait MotionSensorPort {
    /// `true` while the sensor reports motion.
    fn sample(&mut self) -> bool;
}

/// Door servo.
pub trait DoorActuatorPort {
    /// Drive the door to its open (`true`) or closed (`false`) angle.
    fn set_open(&mut self, open: bool);
}

/// Text display.
pub trait DisplayPort {
    /// Replace the screen contents with `lines`, top to bottom.
    fn render(&mut self, lines: &[&str]);
}

/// Network link (WiFi station + provisioning).
pub trait LinkPort {
    fn is_up(&self) -> bool;

    /// Bring the link up, running provisioning if needed.  Blocking.
    fn connect(&mut self) -> bool;
}

/// Monotonic and wall-clock time.
pub trait ClockPort {
    /// Milliseconds since boot (monotonic).
    fn uptime_ms(&self) -> u64;

    /// Seconds since the Unix epoch.  Meaningless (near zero) until the
    /// first successful [`resync`](Self::resync).
    fn epoch_secs(&self) -> u64;

    /// Re-synchronise the wall clock.  Returns `true` once synced.
    fn resync(&mut self) -> bool;
}

/// Everything the service needs from the board in one bound, so call
/// sites take a single `&mut hw` instead of five borrows.
pub trait DevicePorts:
    MotionSensorPort + DoorActuatorPort + DisplayPort + LinkPort + ClockPort
{
}

impl<T> DevicePorts for T where
    T: MotionSensorPort + DoorActuatorPort + DisplayPort + LinkPort + ClockPort
{
}

// ───────────────────────────────────────────────────────────────
// Storage ports (driven adapters: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Fixed-layout byte region (EEPROM-style NVS blob).
pub trait RegionStore {
    /// Fill `buf` with the bytes at `offset`.  Erased bytes read as `0xFF`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Stage `data` at `offset`.  Not durable until [`commit`](Self::commit).
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    fn commit(&mut self) -> Result<(), StorageError>;
}

/// A single flat file on the flash filesystem.
pub trait FileStore {
    /// Whole file contents.  Missing file → [`StorageError::NotFound`].
    fn read_to_string(&self) -> Result<String, StorageError>;

    /// Replace the whole file.
    fn write_all(&mut self, contents: &str) -> Result<(), StorageError>;
}

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting and
/// reject invalid ranges with [`ConfigError::ValidationFailed`] rather
/// than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Network ports (driven adapters: domain ↔ backend)
// ───────────────────────────────────────────────────────────────

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Transport failure before a status line was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// Connection could not be opened.
    Connect,
    /// No complete response within the timeout.
    Timeout,
    /// Read / write failed mid-exchange.
    Io,
}

impl core::fmt::Display for HttpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Connect => write!(f, "connect failed"),
            Self::Timeout => write!(f, "timed out"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

/// One-shot request/response client.
pub trait HttpPort {
    /// POST `body` as `application/json`, waiting at most `timeout_ms`.
    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<HttpResponse, HttpError>;
}

/// A frame (or connection event) received from the session transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionFrame {
    /// Application payload.
    Text(String),
    /// Peer probe; the transport answers it itself.
    Ping,
    /// Answer to one of our probes.
    Pong,
    /// Peer closed the connection or the transport failed.
    Closed,
}

/// Persistent bidirectional connection to the backend.
pub trait SessionTransport {
    /// Open the connection, waiting at most `timeout_ms` for the handshake.
    fn connect(&mut self, url: &str, timeout_ms: u32) -> Result<(), SessionError>;

    fn send_text(&mut self, payload: &str) -> Result<(), SessionError>;

    /// Send a liveness probe.
    fn send_ping(&mut self) -> Result<(), SessionError>;

    /// Next received frame, if any.  Never blocks.
    fn poll(&mut self) -> Option<SessionFrame>;

    /// Tear the connection down.  Idempotent.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the service)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes every tick.
///
/// The [`Scheduler`](crate::scheduler::Scheduler) only knows task ids and
/// intervals; what a task does is up to the delegate.
pub trait SchedulerDelegate {
    /// Runs first on every tick, before any interval check, so commands
    /// that just arrived are dispatched in the same tick.
    fn drain_inbound(&mut self, now_ms: u64);

    /// Called for each task whose interval has elapsed.
    fn run_task(&mut self, task: TaskId, now_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
