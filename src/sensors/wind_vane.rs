//! Wind vane direction classifier.
//!
//! The vane is a ring of reed switches, each closing a different resistor
//! to ground.  Through a fixed divider the ADC sees one of 16 distinct
//! levels; a reading is classified as the nearest calibrated level.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: [`VaneAdc`] reads ADC1 via the oneshot API (initialised by
//! hw_init).  On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use crate::app::ports::AdcSource;
use crate::error::SensorError;

/// Ordered `(label, target_reading)` calibration points.
pub type CalibrationTable = [(&'static str, i32); 16];

/// 12-bit ADC targets for a 3377 Ω divider impedance (a 5.1 kΩ and a
/// 10 kΩ resistor in parallel).  Wiring: divider, then the ADC tap, then
/// the vane, then ground.
///
/// Iteration order is the tie-break order.
pub const VANE_CALIBRATION: CalibrationTable = [
    ("NE", 2901),
    ("E", 936),
    ("SE", 1616),
    ("S", 2195),
    ("SW", 3382),
    ("W", 3984),
    ("NW", 3893),
    ("N", 3716),
    ("NNE", 2705),
    ("ENE", 855),
    ("ESE", 693),
    ("SSE", 1204),
    ("SSW", 1972),
    ("WSW", 3305),
    ("WNW", 3792),
    ("NNW", 3548),
];

/// Label of the calibration point nearest to `reading`.
///
/// Ties go to the entry that appears first in `table`.
pub fn classify(table: &CalibrationTable, reading: i32) -> &'static str {
    let mut best = table[0];
    let mut best_diff = best.1.abs_diff(reading);
    for &entry in &table[1..] {
        let diff = entry.1.abs_diff(reading);
        if diff < best_diff {
            best = entry;
            best_diff = diff;
        }
    }
    best.0
}

// ── ADC source ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_VANE_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_vane_adc(raw: u16) {
    SIM_VANE_ADC.store(raw, Ordering::Relaxed);
}

/// The wind vane's ADC1 channel.
pub struct VaneAdc {
    _channel: u32,
}

impl VaneAdc {
    pub fn new(channel: u32) -> Self {
        Self { _channel: channel }
    }
}

impl AdcSource for VaneAdc {
    #[cfg(target_os = "espidf")]
    fn read(&mut self) -> Result<u16, SensorError> {
        crate::drivers::hw_init::adc1_read(self._channel)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read(&mut self) -> Result<u16, SensorError> {
        Ok(SIM_VANE_ADC.load(Ordering::Relaxed))
    }
}

// ── Sensor ───────────────────────────────────────────────────

/// A sampled vane position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaneReading {
    pub raw: u16,
    pub direction: &'static str,
}

/// Wind vane: an ADC source plus its calibration table.
pub struct WindVane<A> {
    adc: A,
    table: &'static CalibrationTable,
}

impl<A: AdcSource> WindVane<A> {
    pub fn new(adc: A) -> Self {
        Self::with_table(adc, &VANE_CALIBRATION)
    }

    pub fn with_table(adc: A, table: &'static CalibrationTable) -> Self {
        Self { adc, table }
    }

    /// Take one ADC sample and classify it.
    pub fn sample(&mut self) -> Result<VaneReading, SensorError> {
        let raw = self.adc.read()?;
        Ok(VaneReading {
            raw,
            direction: classify(self.table, i32::from(raw)),
        })
    }
}
