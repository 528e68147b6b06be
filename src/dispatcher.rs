//! Inbound command path.
//!
//! Decodes one session payload and applies it to the door and the
//! screen.  Door commands only act on a state change, so a repeated
//! `open` is harmless.  Undecodable payloads are dropped here.

use log::{debug, info};

use crate::app::commands::{self, DoorCommand, InboundMessage};
use crate::app::context::{DeviceContext, DoorState};
use crate::app::events::EventKind;
use crate::app::ports::DoorActuatorPort;

/// What a dispatched payload changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Door event to report, if the door actually moved.
    pub door_event: Option<EventKind>,
    pub screen_changed: bool,
}

/// Decode and apply one inbound payload.
pub fn dispatch(
    ctx: &mut DeviceContext,
    payload: &str,
    door: &mut impl DoorActuatorPort,
) -> DispatchOutcome {
    match commands::decode(payload) {
        Ok(msg) => apply(ctx, msg, door),
        Err(e) => {
            debug!("Dispatch: dropping {:?} ({})", payload, e);
            DispatchOutcome::default()
        }
    }
}

/// Apply an already decoded message.
pub fn apply(
    ctx: &mut DeviceContext,
    msg: InboundMessage,
    door: &mut impl DoorActuatorPort,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    if let Some(mode) = msg.screen_mode {
        if ctx.screen_mode != mode {
            info!("Dispatch: screen mode {:?}", mode);
            ctx.screen_mode = mode;
            outcome.screen_changed = true;
        }
    }

    outcome.door_event = match (msg.command, ctx.door) {
        (Some(DoorCommand::Open), DoorState::Closed) => {
            door.set_open(true);
            ctx.door = DoorState::Open;
            info!("Dispatch: door opened");
            Some(EventKind::DoorOpened)
        }
        (Some(DoorCommand::Close), DoorState::Open) => {
            door.set_open(false);
            ctx.door = DoorState::Closed;
            info!("Dispatch: door closed");
            Some(EventKind::DoorClosed)
        }
        (Some(cmd), state) => {
            debug!("Dispatch: {:?} ignored, door already {:?}", cmd, state);
            None
        }
        (None, _) => None,
    };
    outcome
}
