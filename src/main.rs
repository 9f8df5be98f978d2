//! Weatherstation firmware entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       Adapters (outer ring)                      │
//! │                                                                  │
//! │  GPIO ISRs ──▶ EdgeDispatcher     VaneAdc      SystemClock       │
//! │  (falling edge) (atomic counters) (AdcSource)  (MonotonicClock)  │
//! │                                                                  │
//! │  ──────────────────── Port Trait Boundary ─────────────────────  │
//! │                                                                  │
//! │   App core:  FlushScheduler (wind 5 s / rain 600 s windows)      │
//! │   Pro core:  wind direction loop                                 │
//! │                          │                                       │
//! │                   QueueSink (embassy-sync)                       │
//! │                          ▼                                       │
//! │   main task: Publisher ──▶ MqttPublisher (or LogSink)            │
//! │              broker PUBACK of a wind/rain report ──▶ feed TWDT   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use weatherstation::adapters::discovery;
use weatherstation::adapters::log_sink::LogSink;
use weatherstation::adapters::mqtt::MqttPublisher;
use weatherstation::adapters::report_queue::{Publisher, QueueSink, REPORT_QUEUE};
use weatherstation::adapters::time::{SystemClock, ThreadDelay};
use weatherstation::adapters::wifi::WifiStation;
use weatherstation::app::events::WindowId;
use weatherstation::app::ports::DeliverySink;
use weatherstation::config::{NetworkConfig, StationConfig};
use weatherstation::drivers::hw_init;
use weatherstation::drivers::task_pin::{Core, spawn_on_core};
use weatherstation::drivers::watchdog::Watchdog;
use weatherstation::pins;
use weatherstation::scheduler::ReportTopics;
use weatherstation::sensors::wind_vane::VaneAdc;
use weatherstation::sensors::{EdgeDispatcher, SensorCounters, WindVane};
use weatherstation::tasks;

// ── Task placement ────────────────────────────────────────────

const WIND_RAIN_PRIORITY: u8 = 5;
const WIND_RAIN_STACK_KB: usize = 8;
const WIND_DIR_PRIORITY: u8 = 4;
const WIND_DIR_STACK_KB: usize = 6;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Weatherstation v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let cfg = StationConfig::load().unwrap_or_else(|e| {
        warn!("config: {}, using defaults", e);
        StationConfig::default()
    });
    info!(
        "config: wind {}s, rain {}s, debounce {}us / {}us, watchdog {}ms",
        cfg.wind_report_period_secs,
        cfg.rain_report_period_secs,
        cfg.anemometer_debounce_us(),
        cfg.rain_gauge_debounce_us(),
        cfg.watchdog_timeout_ms(),
    );
    let net = NetworkConfig::from_build_env();

    // ── 3. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();
    let _wifi = WifiStation::connect(
        peripherals.modem,
        sysloop,
        nvs,
        net.wifi_ssid,
        net.wifi_password,
    )?;

    let mut sink: Box<dyn DeliverySink> = match MqttPublisher::connect_with_retry(&net) {
        Some(mut mqtt) => {
            if let Err(e) = mqtt.announce() {
                warn!("mqtt: announce failed: {}", e);
            }
            Box::new(mqtt)
        }
        None => {
            warn!("MQTT_HOST not set, reports go to the serial log only");
            Box::new(LogSink::new())
        }
    };

    // ── 4. Sensors ────────────────────────────────────────────
    let dispatcher: &'static EdgeDispatcher = Box::leak(Box::new(EdgeDispatcher::new(
        pins::ANEMOMETER_GPIO,
        pins::RAIN_GAUGE_GPIO,
        SensorCounters::from_config(&cfg),
    )));
    hw_init::init_adc(pins::WIND_VANE_ADC1_CHANNEL)?;

    // ── 5. Wind + rain (App core; ISRs installed from there) ──
    let wind_topic = discovery::entity_for(WindowId::Wind).state_topic();
    let rain_topic = discovery::entity_for(WindowId::Rain).state_topic();
    let watched_topics = [wind_topic.clone(), rain_topic.clone()];
    let flush_cfg = cfg.clone();
    spawn_on_core(
        Core::App,
        WIND_RAIN_PRIORITY,
        WIND_RAIN_STACK_KB,
        "wind_rain\0",
        move || {
            if let Err(e) = hw_init::install_pulse_isrs(dispatcher) {
                error!("{}, restarting", e);
                // SAFETY: esp_restart never returns.
                unsafe { esp_idf_svc::sys::esp_restart() };
            }
            let mut clock = SystemClock::new();
            let mut sink = QueueSink::new(&REPORT_QUEUE);
            let topics = ReportTopics {
                wind: &wind_topic,
                rain: &rain_topic,
            };
            tasks::run_wind_and_rain(dispatcher, &flush_cfg, topics, &mut clock, &mut sink)
        },
    )?;

    // ── 6. Wind direction ─────────────────────────────────────
    let dir_topic = discovery::WIND_DIRECTION.state_topic();
    let dir_period_ms = cfg.wind_report_period_secs.saturating_mul(1000);
    spawn_on_core(
        Core::Pro,
        WIND_DIR_PRIORITY,
        WIND_DIR_STACK_KB,
        "wind_dir\0",
        move || {
            let vane = WindVane::new(VaneAdc::new(pins::WIND_VANE_ADC1_CHANNEL));
            let mut sink = QueueSink::new(&REPORT_QUEUE);
            tasks::run_direction_loop(vane, &mut sink, &dir_topic, ThreadDelay, dir_period_ms)
        },
    )?;

    // ── 7. Publisher + watchdog ───────────────────────────────
    // Fed only by broker-confirmed wind or rain deliveries.
    let watchdog = Watchdog::new(cfg.watchdog_timeout_ms());
    let watched = [watched_topics[0].as_str(), watched_topics[1].as_str()];
    info!("System ready. Publishing reports.");
    Publisher::new(&REPORT_QUEUE, &watched).run(sink.as_mut(), || watchdog.feed())
}
