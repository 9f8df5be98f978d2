//! Application core boundary.
//!
//! All interaction with hardware and the network happens through the
//! **port traits** defined in [`ports`], keeping the counting, scheduling
//! and classification logic fully testable without real peripherals.
//! [`events`] holds the structured records the core hands outward.

pub mod events;
pub mod ports;
