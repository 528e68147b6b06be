//! Peripheral drivers and one-shot hardware initialisation.

pub mod hw_init;
pub mod pir;
pub mod servo;
pub mod watchdog;
