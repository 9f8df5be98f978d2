//! MQTT publisher adapter.
//!
//! Implements [`DeliverySink`] over the ESP-IDF MQTT client.  Every publish
//! is QoS 1 with the retain flag set, so Home Assistant sees the last value
//! immediately after a restart.  The broker is told to mark the station
//! `offline` through the last-will if the connection drops.
//!
//! `publish` returning a message id only means the client queued it in its
//! outbox.  Delivery is the broker's PUBACK, which arrives on the client's
//! event callback as `Published(id)` and is recorded in an [`AckLog`].
//!
//! On host builds the client is replaced by a logging stand-in whose
//! broker acknowledges every message at once.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::{Deque, Vec};
use log::{info, warn};

use crate::adapters::discovery::{self, AVAILABILITY_TOPIC, PAYLOAD_ONLINE};
use crate::app::ports::{ACK_BATCH, DeliverySink, MessageId, ReportSink};
use crate::config::NetworkConfig;
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EventPayload, LwtConfiguration, MqttClientConfiguration, QoS,
};

// ── Acknowledgements ──────────────────────────────────────────

/// Ids acknowledged by the broker and not yet collected.  Written from the
/// MQTT event task, drained by the publisher.  When full the oldest id is
/// dropped.
pub struct AckLog {
    recent: Mutex<CriticalSectionRawMutex, RefCell<Deque<MessageId, ACK_BATCH>>>,
}

impl AckLog {
    pub const fn new() -> Self {
        Self {
            recent: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    pub fn record(&self, id: MessageId) {
        self.recent.lock(|recent| {
            let mut recent = recent.borrow_mut();
            if recent.is_full() {
                recent.pop_front();
            }
            let _ = recent.push_back(id);
        });
    }

    /// Take every recorded id, oldest first.
    pub fn drain(&self) -> Vec<MessageId, ACK_BATCH> {
        self.recent.lock(|recent| {
            let mut recent = recent.borrow_mut();
            let mut out = Vec::new();
            while let Some(id) = recent.pop_front() {
                let _ = out.push(id);
            }
            out
        })
    }
}

impl Default for AckLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Acknowledgements from the device client's event callback.
#[cfg(target_os = "espidf")]
static BROKER_ACKS: AckLog = AckLog::new();

/// Wait between failed client creations.
pub const CONNECT_RETRY: Duration = Duration::from_secs(5);

pub struct MqttPublisher {
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(not(target_os = "espidf"))]
    broker_url: String,
    #[cfg(not(target_os = "espidf"))]
    next_id: MessageId,
    #[cfg(not(target_os = "espidf"))]
    acks: AckLog,
}

impl MqttPublisher {
    /// Create the client.  The connection itself completes in the
    /// background; publishes issued before then sit in the client outbox.
    #[cfg(target_os = "espidf")]
    pub fn connect(net: &NetworkConfig) -> Result<Self, CommsError> {
        let url = net.broker_url().ok_or(CommsError::NotConnected)?;
        let conf = MqttClientConfiguration {
            client_id: Some(net.mqtt_client_id),
            username: net.mqtt_user,
            password: net.mqtt_password,
            lwt: Some(LwtConfiguration {
                topic: AVAILABILITY_TOPIC,
                payload: discovery::PAYLOAD_OFFLINE.as_bytes(),
                qos: QoS::AtLeastOnce,
                retain: true,
            }),
            ..Default::default()
        };

        let client = EspMqttClient::new_cb(&url, &conf, |event| match event.payload() {
            EventPayload::Connected(_) => info!("mqtt: connected"),
            EventPayload::Disconnected => warn!("mqtt: disconnected"),
            EventPayload::Published(id) => BROKER_ACKS.record(id),
            EventPayload::Error(e) => warn!("mqtt: {:?}", e),
            _ => {}
        })
        .map_err(|e| {
            warn!("mqtt: client creation for {} failed: {}", url, e);
            CommsError::NotConnected
        })?;

        info!("mqtt: client for {} created", url);
        Ok(Self { client })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn connect(net: &NetworkConfig) -> Result<Self, CommsError> {
        let broker_url = net.broker_url().ok_or(CommsError::NotConnected)?;
        info!("mqtt(sim): would connect to {}", broker_url);
        Ok(Self {
            broker_url,
            next_id: 1,
            acks: AckLog::new(),
        })
    }

    /// Retry [`connect`](Self::connect) every [`CONNECT_RETRY`] until it
    /// succeeds.  `None` when no broker is configured.
    pub fn connect_with_retry(net: &NetworkConfig) -> Option<Self> {
        net.mqtt_host?;
        loop {
            match Self::connect(net) {
                Ok(publisher) => return Some(publisher),
                Err(e) => {
                    warn!("mqtt: {} (retrying in {}s)", e, CONNECT_RETRY.as_secs());
                    std::thread::sleep(CONNECT_RETRY);
                }
            }
        }
    }

    /// Mark the station online and publish every discovery config.
    pub fn announce(&mut self) -> Result<(), CommsError> {
        self.publish(AVAILABILITY_TOPIC, PAYLOAD_ONLINE)?;
        for entity in discovery::ENTITIES {
            let payload = entity.config_payload().map_err(|e| {
                warn!("discovery: {} encode failed: {}", entity.object_id, e);
                CommsError::PublishFailed
            })?;
            self.publish(&entity.config_topic(), &payload)?;
        }
        info!("mqtt: availability and {} discovery configs published", discovery::ENTITIES.len());
        Ok(())
    }
}

impl MqttPublisher {
    #[cfg(target_os = "espidf")]
    fn enqueue(&mut self, topic: &str, payload: &str) -> Result<MessageId, CommsError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload.as_bytes())
            .map_err(|e| {
                warn!("mqtt: publish to {} failed: {}", topic, e);
                CommsError::PublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn enqueue(&mut self, topic: &str, payload: &str) -> Result<MessageId, CommsError> {
        info!("mqtt(sim) {} | {} = {}", self.broker_url, topic, payload);
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }
}

/// Fire-and-forget publish, used for availability and discovery.
impl ReportSink for MqttPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        self.enqueue(topic, payload).map(|_| ())
    }
}

impl DeliverySink for MqttPublisher {
    fn send(&mut self, topic: &str, payload: &str) -> Result<MessageId, CommsError> {
        let id = self.enqueue(topic, payload)?;
        #[cfg(not(target_os = "espidf"))]
        self.acks.record(id);
        Ok(id)
    }

    #[cfg(target_os = "espidf")]
    fn take_acks(&mut self) -> Vec<MessageId, ACK_BATCH> {
        BROKER_ACKS.drain()
    }

    #[cfg(not(target_os = "espidf"))]
    fn take_acks(&mut self) -> Vec<MessageId, ACK_BATCH> {
        self.acks.drain()
    }
}
