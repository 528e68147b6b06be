//! Outbound session messages.
//!
//! Everything the device sends over the session is built here and
//! serialised with `serde_json`:
//!
//! | Message       | Wire form                                                   |
//! |---------------|-------------------------------------------------------------|
//! | event         | `{"device_id":42,"event":"new_mail","time":"2024-05-01 08:00:00"}` |
//! | registration  | `{"type":"register","device_id":42}`                        |
//! | door command  | `{"type":"command","command":"open"}`                       |

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::identity::DeviceId;

use super::commands::DoorCommand;

/// Domain event kinds reported to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NewMail,
    DoorOpened,
    DoorClosed,
    Rebooted,
    Error,
}

/// `YYYY-MM-DD HH:MM:SS`, UTC.
pub type Timestamp = heapless::String<19>;

/// Format an epoch second count as an event timestamp.
///
/// An unsynced clock produces a 1970 date, which is what the backend
/// has always received from a device that boots without NTP.
pub fn format_timestamp(epoch_secs: u64) -> Timestamp {
    let mut out = Timestamp::new();
    let Ok(dt) = OffsetDateTime::from_unix_timestamp(epoch_secs as i64) else {
        let _ = out.push_str("1970-01-01 00:00:00");
        return out;
    };
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    match dt.format(&fmt) {
        Ok(s) => {
            let _ = out.push_str(&s);
        }
        Err(_) => {
            let _ = out.push_str("1970-01-01 00:00:00");
        }
    }
    out
}

/// A timestamped domain event attributed to this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceEvent {
    pub device_id: DeviceId,
    #[serde(rename = "event")]
    pub kind: EventKind,
    #[serde(rename = "time")]
    pub timestamp: Timestamp,
}

impl DeviceEvent {
    pub fn new(kind: EventKind, device_id: DeviceId, epoch_secs: u64) -> Self {
        Self {
            device_id,
            kind,
            timestamp: format_timestamp(epoch_secs),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Typed control messages (tagged by `type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    /// Bind this session to a device identity.
    Register { device_id: DeviceId },
    /// Ask the backend to actuate the door.
    Command { command: DoorCommand },
}

impl ControlMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
