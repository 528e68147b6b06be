//! Pochtomat firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod pins;
pub mod pipeline;
pub mod registration;
pub mod scheduler;
pub mod screen;
pub mod session;

// Adapters and drivers compile on every target; the hardware paths are
// cfg-gated inside.
pub mod adapters;
pub mod drivers;
