//! GPIO / peripheral pin assignments for the Pochtomat board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Mail sensor (HC-SR501 PIR)
// ---------------------------------------------------------------------------

/// Digital input: HIGH while the PIR reports motion.
pub const PIR_GPIO: i32 = 14;

// ---------------------------------------------------------------------------
// Door servo (SG90)
// ---------------------------------------------------------------------------

/// LEDC PWM output driving the door servo.
pub const SERVO_GPIO: i32 = 2;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// Hobby servo frame rate.
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// LEDC duty resolution for the servo timer (bits).
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 14;
/// Pulse width at 0°.
pub const SERVO_MIN_PULSE_US: u32 = 500;
/// Pulse width at 180°.
pub const SERVO_MAX_PULSE_US: u32 = 2_500;
