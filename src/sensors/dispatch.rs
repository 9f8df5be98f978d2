//! Interrupt dispatch surface.
//!
//! The GPIO interrupt layer hands us `(pin, timestamp)` for every qualifying
//! edge; this module routes it to the matching [`DebouncedCounter`].
//!
//! ```text
//!   GPIO14 ─┐                      ┌─▶ anemometer counter
//!           ├─▶ EdgeDispatcher ────┤
//!   GPIO15 ─┘    (by pin id)       └─▶ rain-gauge counter
//! ```
//!
//! Everything here runs in interrupt context, so it never blocks and never
//! logs.  Edges from an unrecognised pin are tallied and left for the flush
//! loop to report from task context.

use core::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use super::counter::{DebouncedCounter, EdgeOutcome};
use crate::config::StationConfig;

/// The two pulse sensors the station counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseSensor {
    Anemometer,
    RainGauge,
}

/// One debounced counter per pulse sensor.
#[derive(Debug)]
pub struct SensorCounters {
    pub anemometer: DebouncedCounter,
    pub rain_gauge: DebouncedCounter,
}

impl SensorCounters {
    pub const fn new(anemometer_debounce_us: u64, rain_gauge_debounce_us: u64) -> Self {
        Self {
            anemometer: DebouncedCounter::new(anemometer_debounce_us),
            rain_gauge: DebouncedCounter::new(rain_gauge_debounce_us),
        }
    }

    /// Counters with debounce intervals derived from the sensors' maximum
    /// measurable rates.
    pub fn from_config(cfg: &StationConfig) -> Self {
        Self::new(cfg.anemometer_debounce_us(), cfg.rain_gauge_debounce_us())
    }

    pub fn get(&self, sensor: PulseSensor) -> &DebouncedCounter {
        match sensor {
            PulseSensor::Anemometer => &self.anemometer,
            PulseSensor::RainGauge => &self.rain_gauge,
        }
    }
}

/// Edges that arrived on a pin with no counter attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownEdges {
    pub count: u32,
    pub last_pin: i32,
}

/// Routes edge interrupts to counters by pin identity.
#[derive(Debug)]
pub struct EdgeDispatcher {
    anemometer_pin: i32,
    rain_gauge_pin: i32,
    counters: SensorCounters,
    unknown_edges: AtomicU32,
    last_unknown_pin: AtomicI32,
}

impl EdgeDispatcher {
    pub const fn new(anemometer_pin: i32, rain_gauge_pin: i32, counters: SensorCounters) -> Self {
        Self {
            anemometer_pin,
            rain_gauge_pin,
            counters,
            unknown_edges: AtomicU32::new(0),
            last_unknown_pin: AtomicI32::new(-1),
        }
    }

    pub fn counters(&self) -> &SensorCounters {
        &self.counters
    }

    /// Which sensor, if any, is wired to `pin`.
    pub fn sensor_for(&self, pin: i32) -> Option<PulseSensor> {
        if pin == self.anemometer_pin {
            Some(PulseSensor::Anemometer)
        } else if pin == self.rain_gauge_pin {
            Some(PulseSensor::RainGauge)
        } else {
            None
        }
    }

    pub fn pin_for(&self, sensor: PulseSensor) -> i32 {
        match sensor {
            PulseSensor::Anemometer => self.anemometer_pin,
            PulseSensor::RainGauge => self.rain_gauge_pin,
        }
    }

    /// Single entry point for the GPIO interrupt layer.
    pub fn on_edge(&self, pin: i32, timestamp_us: u64) -> EdgeOutcome {
        match self.sensor_for(pin) {
            Some(sensor) => self.counters.get(sensor).on_edge(timestamp_us),
            None => {
                self.last_unknown_pin.store(pin, Ordering::Relaxed);
                self.unknown_edges.fetch_add(1, Ordering::Release);
                EdgeOutcome::UnknownPin
            }
        }
    }

    /// Drain the unknown-pin tally.  Called from task context, which is
    /// where the warning gets logged.
    pub fn take_unknown(&self) -> Option<UnknownEdges> {
        let count = self.unknown_edges.swap(0, Ordering::Acquire);
        (count > 0).then(|| UnknownEdges {
            count,
            last_pin: self.last_unknown_pin.load(Ordering::Relaxed),
        })
    }
}
