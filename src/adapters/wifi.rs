//! WiFi station adapter.
//!
//! Joins the network whose credentials were baked in at build time.  A
//! failed association waits an exponential backoff (2 s → 4 s → … → 60 s)
//! before the next attempt; the station does nothing useful offline, so
//! startup blocks here until the link is up.
//!
//! On host builds connection always succeeds immediately.

use core::time::Duration;

use log::info;

use crate::error::{ConfigError, Error};

const INITIAL_BACKOFF_SECS: u32 = 2;
const MAX_BACKOFF_SECS: u32 = 60;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConfigError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConfigError::ValidationFailed("wifi ssid"));
    }
    Ok(())
}

/// Empty means an open network; otherwise WPA2 length rules.
pub fn validate_password(password: &str) -> Result<(), ConfigError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConfigError::ValidationFailed("wifi password"));
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Backoff
// ───────────────────────────────────────────────────────────────

/// Doubling retry delay, capped at [`MAX_BACKOFF_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    secs: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }
}

impl Backoff {
    /// Delay to wait now; the following call returns the doubled value.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.secs;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
        Duration::from_secs(u64::from(current))
    }
}

// ───────────────────────────────────────────────────────────────
// Station
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

/// A joined WiFi station.  Dropping it tears the link down.
pub struct WifiStation {
    #[cfg(target_os = "espidf")]
    _wifi: BlockingWifi<EspWifi<'static>>,
}

impl WifiStation {
    #[cfg(target_os = "espidf")]
    pub fn connect(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        ssid: &str,
        password: &str,
    ) -> Result<Self, Error> {
        validate_ssid(ssid)?;
        validate_password(password)?;

        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)
            .map_err(|_| Error::Init("wifi driver"))?;
        let mut wifi =
            BlockingWifi::wrap(esp_wifi, sysloop).map_err(|_| Error::Init("wifi event loop"))?;

        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| ConfigError::ValidationFailed("wifi ssid"))?,
            password: password
                .try_into()
                .map_err(|_| ConfigError::ValidationFailed("wifi password"))?,
            auth_method,
            ..Default::default()
        }))
        .map_err(|_| Error::Init("wifi configuration"))?;
        wifi.start().map_err(|_| Error::Init("wifi start"))?;

        let mut backoff = Backoff::default();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match wifi.connect().and_then(|()| wifi.wait_netif_up()) {
                Ok(()) => break,
                Err(e) => {
                    let delay = backoff.next_delay();
                    log::warn!(
                        "WiFi: attempt {} to join '{}' failed ({}), retrying in {}s",
                        attempt,
                        ssid,
                        e,
                        delay.as_secs()
                    );
                    let _ = wifi.disconnect();
                    std::thread::sleep(delay);
                }
            }
        }

        match wifi.wifi().sta_netif().get_ip_info() {
            Ok(ip) => info!("WiFi: joined '{}' as {}", ssid, ip.ip),
            Err(_) => info!("WiFi: joined '{}'", ssid),
        }
        Ok(Self { _wifi: wifi })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn connect(ssid: &str, password: &str) -> Result<Self, Error> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        info!("WiFi(sim): joined '{}'", ssid);
        Ok(Self {})
    }
}
