//! Door servo driver (SG90 hobby servo).
//!
//! Angle control via LEDC PWM (ch0): 50 Hz frame, pulse width linear in
//! angle between [`SERVO_MIN_PULSE_US`] and [`SERVO_MAX_PULSE_US`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins::{
    SERVO_MAX_PULSE_US, SERVO_MIN_PULSE_US, SERVO_PWM_FREQ_HZ, SERVO_PWM_RESOLUTION_BITS,
};

pub const MAX_ANGLE: u8 = 180;

pub struct ServoDriver {
    open_angle: u8,
    closed_angle: u8,
    angle: Option<u8>,
}

impl ServoDriver {
    pub fn new(open_angle: u8, closed_angle: u8) -> Self {
        Self {
            open_angle: open_angle.min(MAX_ANGLE),
            closed_angle: closed_angle.min(MAX_ANGLE),
            angle: None,
        }
    }

    /// Move to the open or closed angle.
    pub fn drive(&mut self, open: bool) {
        let target = if open {
            self.open_angle
        } else {
            self.closed_angle
        };
        self.set_angle(target);
    }

    pub fn set_angle(&mut self, angle: u8) {
        let angle = angle.min(MAX_ANGLE);
        hw_init::ledc_set(hw_init::LEDC_CH_SERVO, duty_for_angle(angle));
        self.angle = Some(angle);
    }

    /// Last commanded angle; `None` before the first command.
    pub fn angle(&self) -> Option<u8> {
        self.angle
    }
}

/// LEDC duty value for `angle` at the servo timer's resolution.
pub fn duty_for_angle(angle: u8) -> u32 {
    let span = SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US;
    let pulse_us = SERVO_MIN_PULSE_US + span * u32::from(angle.min(MAX_ANGLE)) / u32::from(MAX_ANGLE);
    let period_us = 1_000_000 / SERVO_PWM_FREQ_HZ;
    let full_scale = 1u32 << SERVO_PWM_RESOLUTION_BITS;
    pulse_us * full_scale / period_us
}
