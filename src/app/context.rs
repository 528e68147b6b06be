//! Shared mutable device state.
//!
//! `DeviceContext` is the one struct the pipeline, dispatcher and service
//! read from and write to.  It is rebuilt from scratch at every boot;
//! only the identity is reloaded from flash.

use crate::identity::DeviceId;

use super::commands::ScreenMode;
use super::events::Timestamp;

/// Last sampled PIR level.  Not debounced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    Active,
}

impl MotionState {
    pub fn from_sample(motion: bool) -> Self {
        if motion { Self::Active } else { Self::Idle }
    }
}

/// Door position as last commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoorState {
    #[default]
    Closed,
    Open,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceContext {
    /// Backend-assigned identity; `None` until loaded or registered.
    pub identity: Option<DeviceId>,
    pub door: DoorState,
    pub motion: MotionState,
    pub screen_mode: ScreenMode,
    /// Uptime of the last `new_mail` emission, for the cooldown gate.
    pub last_mail_ms: Option<u64>,
    /// Wall-clock stamp of the last `new_mail`, for the display.
    pub last_mail_time: Option<Timestamp>,
    /// Set once the `rebooted` announcement went out this boot.
    pub boot_announced: bool,
}

impl DeviceContext {
    pub fn new(identity: Option<DeviceId>) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }
}
