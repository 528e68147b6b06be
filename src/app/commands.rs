//! Inbound session messages.
//!
//! The backend talks to the device in two dialects: a bare keyword
//! (`open`, optionally JSON-quoted as `"open"`) or a JSON object such as
//! `{"command":"close","screen_mode":1}`.  [`decode`] folds both into one
//! closed [`InboundMessage`].  Anything else is an explicit
//! [`PayloadError`]; the dispatcher decides to drop it.

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// Door commands the backend may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorCommand {
    Open,
    Close,
}

impl DoorCommand {
    fn from_keyword(keyword: &str) -> Result<Self, PayloadError> {
        match keyword.trim() {
            "open" => Ok(Self::Open),
            "close" => Ok(Self::Close),
            _ => Err(PayloadError::UnknownCommand),
        }
    }
}

/// What the 2 s display refresh shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScreenMode {
    /// Current date and time.
    #[default]
    Clock,
    /// Timestamp of the last `new_mail` event.
    LastMail,
}

impl ScreenMode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Clock),
            1 => Some(Self::LastMail),
            _ => None,
        }
    }
}

/// A decoded inbound message.  At least one field is `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundMessage {
    pub command: Option<DoorCommand>,
    pub screen_mode: Option<ScreenMode>,
}

/// Object form.  Unknown fields (`type`, `device_id`, ...) are ignored.
#[derive(Deserialize)]
struct ObjectMessage {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    screen_mode: Option<u8>,
}

/// Decode one inbound payload.
pub fn decode(payload: &str) -> Result<InboundMessage, PayloadError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(PayloadError::Empty);
    }

    match payload.as_bytes()[0] {
        b'{' => decode_object(payload),
        b'"' => {
            let keyword: String =
                serde_json::from_str(payload).map_err(|_| PayloadError::Malformed)?;
            command_only(&keyword)
        }
        _ => command_only(payload),
    }
}

fn command_only(keyword: &str) -> Result<InboundMessage, PayloadError> {
    Ok(InboundMessage {
        command: Some(DoorCommand::from_keyword(keyword)?),
        screen_mode: None,
    })
}

fn decode_object(payload: &str) -> Result<InboundMessage, PayloadError> {
    let raw: ObjectMessage =
        serde_json::from_str(payload).map_err(|_| PayloadError::Malformed)?;

    let command = raw
        .command
        .as_deref()
        .map(DoorCommand::from_keyword)
        .transpose()?;
    let screen_mode = raw.screen_mode.and_then(ScreenMode::from_code);

    if command.is_none() && screen_mode.is_none() {
        return Err(PayloadError::UnknownCommand);
    }
    Ok(InboundMessage {
        command,
        screen_mode,
    })
}
