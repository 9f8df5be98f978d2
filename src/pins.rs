//! GPIO / peripheral pin assignments for the weatherstation board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Pulse sensors (reed switches to ground, internal pull-ups, falling edge)
// ---------------------------------------------------------------------------

/// Anemometer cup reed switch: one pulse per rotation contact.
pub const ANEMOMETER_GPIO: i32 = 14;
/// Tipping-bucket rain gauge reed switch: one pulse per bucket tip.
pub const RAIN_GAUGE_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// Wind vane (resistor ladder into ADC1)
// ---------------------------------------------------------------------------

/// Wind vane divider output.  ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const WIND_VANE_ADC_GPIO: i32 = 4;
/// ADC1 channel for [`WIND_VANE_ADC_GPIO`].
pub const WIND_VANE_ADC1_CHANNEL: u32 = 3;
