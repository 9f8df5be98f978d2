//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter        | Implements      | Connects to                 |
//! |----------------|-----------------|-----------------------------|
//! | `time`         | MonotonicClock  | ESP32 high-resolution timer |
//! | `report_queue` | ReportSink      | embassy-sync channel        |
//! | `mqtt`         | DeliverySink    | ESP-IDF MQTT client         |
//! | `log_sink`     | DeliverySink    | Serial log output           |
//! | `discovery`    | (none)          | Home Assistant topics/JSON  |
//! | `wifi`         | (none)          | ESP-IDF WiFi STA            |

pub mod discovery;
pub mod log_sink;
pub mod mqtt;
pub mod report_queue;
pub mod time;
pub mod wifi;
