//! Home Assistant MQTT discovery.
//!
//! Each sensor announces itself with a retained JSON config on
//! `homeassistant/sensor/<object_id>/config` and reports on
//! `homeassistant/sensor/<object_id>/state`.  All three share one
//! availability topic driven by the MQTT last-will.

use serde::Serialize;

use crate::app::events::WindowId;

pub const DISCOVERY_PREFIX: &str = "homeassistant";
pub const AVAILABILITY_TOPIC: &str = "weatherstation/availability";
pub const PAYLOAD_ONLINE: &str = "online";
pub const PAYLOAD_OFFLINE: &str = "offline";

const DEVICE_ID: &str = "weatherstation";

/// Static description of one Home Assistant sensor entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorEntity {
    pub object_id: &'static str,
    pub name: &'static str,
    pub device_class: &'static str,
    pub unit: Option<&'static str>,
}

pub const ANEMOMETER: SensorEntity = SensorEntity {
    object_id: "weatherstation_anemometer",
    name: "windspeed sensor",
    device_class: "wind_speed",
    unit: Some("mph"),
};

pub const RAIN_GAUGE: SensorEntity = SensorEntity {
    object_id: "weatherstation_rain_gauge",
    name: "rainfall sensor",
    device_class: "precipitation_intensity",
    unit: Some("in/h"),
};

pub const WIND_DIRECTION: SensorEntity = SensorEntity {
    object_id: "weatherstation_wind_dir",
    name: "windvane",
    device_class: "enum",
    unit: None,
};

/// Every entity the station announces.
pub const ENTITIES: [SensorEntity; 3] = [ANEMOMETER, RAIN_GAUGE, WIND_DIRECTION];

/// Entity reporting a flush window.
pub fn entity_for(window: WindowId) -> SensorEntity {
    match window {
        WindowId::Wind => ANEMOMETER,
        WindowId::Rain => RAIN_GAUGE,
    }
}

#[derive(Serialize)]
struct DeviceInfo<'a> {
    identifiers: [&'a str; 1],
    name: &'a str,
    sw_version: &'a str,
}

#[derive(Serialize)]
struct DiscoveryConfig<'a> {
    name: &'a str,
    unique_id: &'a str,
    object_id: &'a str,
    device_class: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'a str>,
    state_topic: &'a str,
    availability_topic: &'a str,
    payload_available: &'a str,
    payload_not_available: &'a str,
    device: DeviceInfo<'a>,
}

impl SensorEntity {
    pub fn config_topic(&self) -> String {
        format!("{}/sensor/{}/config", DISCOVERY_PREFIX, self.object_id)
    }

    pub fn state_topic(&self) -> String {
        format!("{}/sensor/{}/state", DISCOVERY_PREFIX, self.object_id)
    }

    /// Retained discovery config payload.
    pub fn config_payload(&self) -> Result<String, serde_json::Error> {
        let state_topic = self.state_topic();
        serde_json::to_string(&DiscoveryConfig {
            name: self.name,
            unique_id: self.object_id,
            object_id: self.object_id,
            device_class: self.device_class,
            unit_of_measurement: self.unit,
            state_topic: &state_topic,
            availability_topic: AVAILABILITY_TOPIC,
            payload_available: PAYLOAD_ONLINE,
            payload_not_available: PAYLOAD_OFFLINE,
            device: DeviceInfo {
                identifiers: [DEVICE_ID],
                name: DEVICE_ID,
                sw_version: env!("CARGO_PKG_VERSION"),
            },
        })
    }
}
