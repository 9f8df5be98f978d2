//! Tick-count to physical-rate conversion.
//!
//! Rates are computed against the *actual* elapsed time of a window, not its
//! nominal period, so scheduling overshoot does not bias the reading.
//!
//! The two sensors follow different reporting conventions:
//!
//! | Sensor     | per-tick constant | Convention | Unit |
//! |------------|-------------------|------------|------|
//! | Anemometer | 1.73 mph          | `Direct`   | mph  |
//! | Rain gauge | 0.011 in          | `PerHour`  | in/h |

use core::fmt::Write;

use crate::config::MICROS_PER_SEC;
use crate::error::CommsError;

/// How ticks-per-second is turned into the reported unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateConvention {
    /// `ticks * per_tick / seconds`; the constant already encodes the unit.
    Direct,
    /// Scaled by 3600 to an hourly-equivalent intensity.
    PerHour,
}

/// Calibration for one pulse sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSpec {
    pub per_tick: f64,
    pub convention: RateConvention,
}

impl RateSpec {
    pub const fn new(per_tick: f64, convention: RateConvention) -> Self {
        Self {
            per_tick,
            convention,
        }
    }

    pub fn rate(&self, ticks: u32, elapsed_us: u64) -> f64 {
        rate(ticks, elapsed_us, self.per_tick, self.convention)
    }
}

/// Calibrated rate for `ticks` observed over `elapsed_us`.
///
/// No clamping or rounding.  A zero-length window reports 0.
pub fn rate(ticks: u32, elapsed_us: u64, per_tick: f64, convention: RateConvention) -> f64 {
    if elapsed_us == 0 {
        return 0.0;
    }
    let elapsed_secs = elapsed_us as f64 / MICROS_PER_SEC as f64;
    let per_sec = f64::from(ticks) * per_tick / elapsed_secs;
    match convention {
        RateConvention::Direct => per_sec,
        RateConvention::PerHour => per_sec * 3600.0,
    }
}

/// Textual decimal for transport (six fractional digits).
pub type RatePayload = heapless::String<32>;

/// Six-decimal text of `value`.  A value too large for [`RatePayload`]
/// is an error, never a truncated or substituted string.
pub fn format_rate(value: f64) -> Result<RatePayload, CommsError> {
    let mut s = RatePayload::new();
    write!(s, "{value:.6}").map_err(|_| CommsError::PayloadTooLong)?;
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_rate_is_direct() {
        let mph = rate(10, 30 * MICROS_PER_SEC, 1.73, RateConvention::Direct);
        assert!((mph - 0.576_666_666).abs() < 1e-6, "got {mph}");
    }

    #[test]
    fn rain_rate_is_hourly() {
        let in_per_h = rate(5, 600 * MICROS_PER_SEC, 0.011, RateConvention::PerHour);
        assert!((in_per_h - 0.33).abs() < 1e-9, "got {in_per_h}");
    }

    #[test]
    fn overshoot_lowers_the_rate() {
        let nominal = rate(3, 5_000_000, 1.73, RateConvention::Direct);
        let late = rate(3, 5_020_000, 1.73, RateConvention::Direct);
        assert!(late < nominal);
        assert!((late - 3.0 * 1.73 / 5.02).abs() < 1e-12);
    }

    #[test]
    fn zero_ticks_is_zero_rate() {
        assert_eq!(rate(0, 5_000_000, 1.73, RateConvention::Direct), 0.0);
    }

    #[test]
    fn zero_elapsed_does_not_divide_by_zero() {
        assert_eq!(rate(4, 0, 0.011, RateConvention::PerHour), 0.0);
    }

    #[test]
    fn method_matches_free_function() {
        let spec = RateSpec::new(0.011, RateConvention::PerHour);
        assert_eq!(
            spec.rate(7, 601_000_000),
            rate(7, 601_000_000, 0.011, RateConvention::PerHour)
        );
    }

    #[test]
    fn payload_has_six_decimals() {
        assert_eq!(format_rate(0.33).unwrap().as_str(), "0.330000");
        assert_eq!(format_rate(0.0).unwrap().as_str(), "0.000000");
        assert_eq!(format_rate(12.5).unwrap().as_str(), "12.500000");
    }

    #[test]
    fn oversized_value_is_an_error() {
        // 25 integer digits plus ".000000" exactly fills the buffer.
        let fits = 2e24;
        assert_eq!(format_rate(fits).unwrap().len(), 32);
        assert_eq!(format_rate(fits * 10.0), Err(CommsError::PayloadTooLong));
        assert_eq!(format_rate(f64::MAX), Err(CommsError::PayloadTooLong));
    }
}
