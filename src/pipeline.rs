//! Mail detection.
//!
//! Raw PIR samples become at most one `new_mail` per visit:
//!
//! * only a rising edge (Idle → Active) can trigger;
//! * the door must be closed (an open door means someone is already
//!   reaching in);
//! * the previous `new_mail` must be at least one cooldown ago.
//!
//! The motion level itself is stored on every poll, gated or not.

use log::debug;

use crate::app::context::{DeviceContext, DoorState, MotionState};
use crate::app::ports::MotionSensorPort;
use crate::config::{OpenMode, SystemConfig};

/// A gated rising edge.  The caller opens the door by `open_mode` and
/// emits `new_mail`.  The door state is left to whoever drives the servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailDetected {
    pub open_mode: OpenMode,
}

pub struct EventPipeline {
    cooldown_ms: u64,
    open_mode: OpenMode,
}

impl EventPipeline {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            cooldown_ms: u64::from(config.mail_cooldown_ms),
            open_mode: config.open_mode,
        }
    }

    /// Sample the sensor once and run the gate.
    pub fn poll(
        &self,
        ctx: &mut DeviceContext,
        sensor: &mut impl MotionSensorPort,
        now_ms: u64,
    ) -> Option<MailDetected> {
        let motion = sensor.sample();
        self.on_sample(ctx, motion, now_ms)
    }

    /// Gate one sample.  On detection the cooldown is stamped.
    pub fn on_sample(
        &self,
        ctx: &mut DeviceContext,
        motion: bool,
        now_ms: u64,
    ) -> Option<MailDetected> {
        let previous = ctx.motion;
        ctx.motion = MotionState::from_sample(motion);

        let rising = previous == MotionState::Idle && ctx.motion == MotionState::Active;
        if !rising {
            return None;
        }

        if ctx.door == DoorState::Open {
            debug!("Pipeline: motion with door open, ignored");
            return None;
        }

        if let Some(last) = ctx.last_mail_ms {
            let since = now_ms.saturating_sub(last);
            if since < self.cooldown_ms {
                debug!("Pipeline: motion {} ms after last mail, cooling down", since);
                return None;
            }
        }

        ctx.last_mail_ms = Some(now_ms);
        Some(MailDetected {
            open_mode: self.open_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> EventPipeline {
        EventPipeline::new(&SystemConfig::default())
    }

    #[test]
    fn first_rising_edge_triggers() {
        let p = pipeline();
        let mut ctx = DeviceContext::default();
        let hit = p.on_sample(&mut ctx, true, 0);
        assert_eq!(
            hit,
            Some(MailDetected {
                open_mode: OpenMode::Local
            })
        );
        assert_eq!(ctx.door, DoorState::Closed);
        assert_eq!(ctx.last_mail_ms, Some(0));
    }

    #[test]
    fn sustained_motion_triggers_once() {
        let p = pipeline();
        let mut ctx = DeviceContext::default();
        let mut hits = 0;
        for t in (0..20_000).step_by(100) {
            if p.on_sample(&mut ctx, true, t).is_some() {
                hits += 1;
            }
        }
        assert_eq!(hits, 1);
        assert_eq!(ctx.motion, MotionState::Active);
    }

    #[test]
    fn open_door_suppresses_rising_edges() {
        let p = pipeline();
        let mut ctx = DeviceContext {
            door: DoorState::Open,
            ..DeviceContext::default()
        };
        assert!(p.on_sample(&mut ctx, true, 20_000).is_none());
        assert_eq!(ctx.motion, MotionState::Active);
        assert!(ctx.last_mail_ms.is_none());
    }

    #[test]
    fn cooldown_gates_new_edges() {
        let p = pipeline();
        let mut ctx = DeviceContext::default();
        assert!(p.on_sample(&mut ctx, true, 0).is_some());

        // New visit within the cooldown.
        p.on_sample(&mut ctx, false, 1_000);
        assert!(p.on_sample(&mut ctx, true, 3_000).is_none());

        p.on_sample(&mut ctx, false, 5_000);
        assert!(p.on_sample(&mut ctx, true, 10_000).is_some());
    }

    #[test]
    fn falling_edge_only_updates_motion() {
        let p = pipeline();
        let mut ctx = DeviceContext::default();
        p.on_sample(&mut ctx, true, 0);
        assert!(p.on_sample(&mut ctx, false, 100).is_none());
        assert_eq!(ctx.motion, MotionState::Idle);
        assert_eq!(ctx.last_mail_ms, Some(0));
    }

    #[test]
    fn open_mode_follows_config() {
        let config = SystemConfig {
            open_mode: OpenMode::ViaBackend,
            ..SystemConfig::default()
        };
        let p = EventPipeline::new(&config);
        let mut ctx = DeviceContext::default();
        assert_eq!(
            p.on_sample(&mut ctx, true, 0).map(|m| m.open_mode),
            Some(OpenMode::ViaBackend)
        );
    }
}
