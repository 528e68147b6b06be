//! Application core: domain state, wire messages and the service.
//!
//! This module contains the business rules for the mailbox: identity
//! lifecycle, session upkeep, mail detection and the inbound command
//! path.  All interaction with hardware and the network happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod context;
pub mod events;
pub mod ports;
pub mod service;
