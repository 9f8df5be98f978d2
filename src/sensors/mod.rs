//! Sensor subsystem.
//!
//! - [`counter`]: debounced tick counter fed from GPIO interrupts.
//! - [`dispatch`]: routes `(pin, timestamp)` interrupts to counters.
//! - [`wind_vane`]: nearest-level classification of the vane ADC.

pub mod counter;
pub mod dispatch;
pub mod wind_vane;

pub use counter::{DebouncedCounter, EdgeOutcome};
pub use dispatch::{EdgeDispatcher, PulseSensor, SensorCounters, UnknownEdges};
pub use wind_vane::{VaneReading, WindVane, classify, VANE_CALIBRATION};
