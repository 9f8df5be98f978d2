//! Station configuration parameters
//!
//! All tunable constants for the wind/rain/direction pipeline.  Values are
//! fixed for the lifetime of the process: defaults below, optionally
//! overridden by a JSON document embedded at build time
//! (`WEATHERSTATION_CONFIG`).  Network credentials are likewise baked in
//! from the build environment.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Microseconds per second, the monotonic clock's unit.
pub const MICROS_PER_SEC: u64 = 1_000_000;

/// Core station configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    // --- Reporting windows ---
    /// Short window: wind speed is averaged and reported this often (seconds).
    /// The wind vane is sampled at the same cadence.
    pub wind_report_period_secs: u32,
    /// Long window: rainfall is accumulated this long before being reported
    /// as an hourly intensity (seconds).
    pub rain_report_period_secs: u32,

    // --- Anemometer ---
    /// Wind speed contributed by one tick per second (mph).
    pub anemometer_mph_per_tick: f32,
    /// Highest wind speed we expect to measure (mph).  Bounds the debounce.
    pub anemometer_max_mph: f32,

    // --- Rain gauge ---
    /// Rainfall represented by one bucket tip (inches).
    pub rain_gauge_inches_per_tick: f32,
    /// Heaviest rainfall we expect to measure (inches per hour).
    pub rain_gauge_max_inches_per_hour: f32,

    // --- Liveness ---
    /// Number of short windows without an acknowledged wind or rain report before the
    /// watchdog resets the device.
    pub watchdog_missed_periods: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            // Windows
            wind_report_period_secs: 5,
            rain_report_period_secs: 10 * 60,

            // Anemometer: linear model up to 100 mph.  In reality doubling
            // the tick rate is probably more than doubling the wind speed.
            anemometer_mph_per_tick: 1.73,
            anemometer_max_mph: 100.0,

            // Rain gauge: up to six inches of rain per hour.
            rain_gauge_inches_per_tick: 0.011,
            rain_gauge_max_inches_per_hour: 6.0,

            watchdog_missed_periods: 3,
        }
    }
}

impl StationConfig {
    /// Load the configuration baked into this build.
    ///
    /// Falls back to [`StationConfig::default`] when no override was set.
    pub fn load() -> Result<Self, ConfigError> {
        let cfg = match option_env!("WEATHERSTATION_CONFIG") {
            Some(json) if !json.trim().is_empty() => Self::from_json(json)?,
            _ => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a (possibly partial) JSON override on top of the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|_| ConfigError::Malformed)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wind_report_period_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "wind_report_period_secs must be > 0",
            ));
        }
        if self.rain_report_period_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "rain_report_period_secs must be > 0",
            ));
        }
        if !is_positive(self.anemometer_mph_per_tick) {
            return Err(ConfigError::ValidationFailed(
                "anemometer_mph_per_tick must be a positive number",
            ));
        }
        if !is_positive(self.anemometer_max_mph) {
            return Err(ConfigError::ValidationFailed(
                "anemometer_max_mph must be a positive number",
            ));
        }
        if !is_positive(self.rain_gauge_inches_per_tick) {
            return Err(ConfigError::ValidationFailed(
                "rain_gauge_inches_per_tick must be a positive number",
            ));
        }
        if !is_positive(self.rain_gauge_max_inches_per_hour) {
            return Err(ConfigError::ValidationFailed(
                "rain_gauge_max_inches_per_hour must be a positive number",
            ));
        }
        if self.watchdog_missed_periods == 0 {
            return Err(ConfigError::ValidationFailed(
                "watchdog_missed_periods must be >= 1",
            ));
        }
        Ok(())
    }

    /// Short (wind) window length in microseconds.
    pub fn wind_window_us(&self) -> u64 {
        u64::from(self.wind_report_period_secs) * MICROS_PER_SEC
    }

    /// Long (rain) window length in microseconds.
    pub fn rain_window_us(&self) -> u64 {
        u64::from(self.rain_report_period_secs) * MICROS_PER_SEC
    }

    /// Minimum spacing between two anemometer ticks.
    ///
    /// At `anemometer_max_mph` the cups produce `max / per_tick` ticks per
    /// second; anything faster is contact bounce.
    pub fn anemometer_debounce_us(&self) -> u64 {
        let max_ticks_per_sec =
            f64::from(self.anemometer_max_mph) / f64::from(self.anemometer_mph_per_tick);
        (MICROS_PER_SEC as f64 / max_ticks_per_sec).round() as u64
    }

    /// Minimum spacing between two rain-gauge ticks.
    pub fn rain_gauge_debounce_us(&self) -> u64 {
        let max_inches_per_sec = f64::from(self.rain_gauge_max_inches_per_hour) / 3600.0;
        let max_ticks_per_sec = max_inches_per_sec / f64::from(self.rain_gauge_inches_per_tick);
        (MICROS_PER_SEC as f64 / max_ticks_per_sec).round() as u64
    }

    /// Watchdog timeout: a few missed short windows plus one second of slack.
    pub fn watchdog_timeout_ms(&self) -> u32 {
        let shortest = self
            .wind_report_period_secs
            .min(self.rain_report_period_secs);
        (1 + self.watchdog_missed_periods.saturating_mul(shortest)).saturating_mul(1000)
    }
}

fn is_positive(v: f32) -> bool {
    v.is_finite() && v > 0.0
}

/// Network credentials and broker settings, fixed at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    /// `None` when no broker was configured; reports then go to the log.
    pub mqtt_host: Option<&'static str>,
    pub mqtt_client_id: &'static str,
    pub mqtt_user: Option<&'static str>,
    pub mqtt_password: Option<&'static str>,
}

impl NetworkConfig {
    pub fn from_build_env() -> Self {
        Self {
            wifi_ssid: option_env!("WIFI_SSID").unwrap_or(""),
            wifi_password: option_env!("WIFI_PASSWORD").unwrap_or(""),
            mqtt_host: option_env!("MQTT_HOST").filter(|s| !s.is_empty()),
            mqtt_client_id: option_env!("MQTT_CLIENT_ID").unwrap_or("weatherstation"),
            mqtt_user: option_env!("MQTT_USER").filter(|s| !s.is_empty()),
            mqtt_password: option_env!("MQTT_PASSWORD").filter(|s| !s.is_empty()),
        }
    }

    /// Broker URL in the form the ESP-IDF MQTT client expects.
    pub fn broker_url(&self) -> Option<String> {
        self.mqtt_host.map(|host| {
            if host.contains("://") {
                host.to_string()
            } else {
                format!("mqtt://{}:1883", host)
            }
        })
    }
}
