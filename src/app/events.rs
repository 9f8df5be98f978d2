//! Outbound records produced by the flush scheduler.
//!
//! A [`Flush`] is captured inside the drain critical section; a
//! [`Report`] is what became of it once converted and handed to the
//! [`ReportSink`](super::ports::ReportSink).

use crate::error::CommsError;
use crate::rate::RatePayload;

/// The two periodic windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowId {
    /// Short window: anemometer, reported as mph.
    Wind,
    /// Long window: rain gauge, reported as in/h.
    Rain,
}

impl WindowId {
    pub fn label(self) -> &'static str {
        match self {
            Self::Wind => "wind",
            Self::Rain => "rain",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Wind => "mph",
            Self::Rain => "in/h",
        }
    }
}

/// Counts drained from one window on one wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flush {
    pub window: WindowId,
    pub ticks: u32,
    /// Nominal period plus overshoot (µs).
    pub elapsed_us: u64,
}

/// A converted flush and the outcome of publishing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub window: WindowId,
    pub ticks: u32,
    pub elapsed_us: u64,
    pub value: f64,
    pub payload: RatePayload,
    pub result: Result<(), CommsError>,
}

impl Report {
    pub fn published(&self) -> bool {
        self.result.is_ok()
    }
}
