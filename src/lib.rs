//! Weatherstation firmware library.
//!
//! Exposes the counting, scheduling and classification logic for
//! integration testing and host simulation.  All ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod rate;
pub mod scheduler;
pub mod sensors;
pub mod tasks;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
