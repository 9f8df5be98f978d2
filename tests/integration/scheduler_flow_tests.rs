//! End-to-end flows: GPIO edges → dispatcher → flush scheduler → sink.

use weatherstation::app::events::WindowId;
use weatherstation::config::StationConfig;
use weatherstation::scheduler::{FlushScheduler, ReportTopics};
use weatherstation::sensors::{EdgeDispatcher, EdgeOutcome, SensorCounters};

use crate::mock_hw::{FailingSink, ManualClock, RecordingSink};

const ANEMOMETER_PIN: i32 = 14;
const RAIN_PIN: i32 = 15;

const TOPICS: ReportTopics<'static> = ReportTopics {
    wind: "weatherstation/wind",
    rain: "weatherstation/rain",
};

fn config(wind_secs: u32, rain_secs: u32) -> StationConfig {
    StationConfig {
        wind_report_period_secs: wind_secs,
        rain_report_period_secs: rain_secs,
        ..StationConfig::default()
    }
}

fn dispatcher(anemometer_debounce_us: u64, rain_debounce_us: u64) -> EdgeDispatcher {
    EdgeDispatcher::new(
        ANEMOMETER_PIN,
        RAIN_PIN,
        SensorCounters::new(anemometer_debounce_us, rain_debounce_us),
    )
}

fn mph_per_tick() -> f64 {
    f64::from(StationConfig::default().anemometer_mph_per_tick)
}

#[test]
fn three_spaced_edges_report_against_actual_elapsed() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 600);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0).with_jitter([20_000]);
    let mut sink = RecordingSink::new();

    for t in [1_000_000, 1_010_000, 1_020_000] {
        assert_eq!(d.on_edge(ANEMOMETER_PIN, t), EdgeOutcome::Counted);
    }

    let reports = s.run_once(&mut clock, &mut sink);
    assert_eq!(clock.now, 5_020_000);
    assert_eq!(reports.len(), 1);

    let r = &reports[0];
    assert_eq!(r.window, WindowId::Wind);
    assert_eq!(r.ticks, 3);
    assert_eq!(r.elapsed_us, 5_020_000);
    let expected = 3.0 * mph_per_tick() / 5.02;
    assert!((r.value - expected).abs() < 1e-12, "got {}", r.value);

    assert_eq!(s.window(WindowId::Wind).next_deadline_us(), 10_020_000);
    assert_eq!(d.counters().anemometer.pending(), 0);
    assert_eq!(sink.topics(), vec!["weatherstation/wind"]);
}

#[test]
fn bounce_inside_debounce_is_not_reported() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 600);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();

    assert_eq!(d.on_edge(ANEMOMETER_PIN, 1_000_000), EdgeOutcome::Counted);
    assert_eq!(d.on_edge(ANEMOMETER_PIN, 1_003_000), EdgeOutcome::Debounced);

    let reports = s.run_once(&mut clock, &mut sink);
    assert_eq!(reports[0].ticks, 1);
}

#[test]
fn simultaneous_windows_report_wind_then_rain() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 10);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();

    let first = s.run_once(&mut clock, &mut sink);
    assert_eq!(first.len(), 1);
    assert_eq!(clock.now, 5_000_000);

    d.on_edge(RAIN_PIN, 7_000_000);
    let second = s.run_once(&mut clock, &mut sink);
    assert_eq!(clock.now, 10_000_000);
    assert_eq!(second.len(), 2);
    assert_eq!(second[0].window, WindowId::Wind);
    assert_eq!(second[1].window, WindowId::Rain);
    assert_eq!(second[1].ticks, 1);
    assert_eq!(second[1].elapsed_us, 10_000_000);

    assert_eq!(
        sink.topics(),
        vec![
            "weatherstation/wind",
            "weatherstation/wind",
            "weatherstation/rain"
        ]
    );
}

#[test]
fn rain_window_reports_hourly_intensity() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(600, 600);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();

    for i in 1..=5u64 {
        d.on_edge(RAIN_PIN, i * 60_000_000);
    }

    let reports = s.run_once(&mut clock, &mut sink);
    let rain = reports
        .iter()
        .find(|r| r.window == WindowId::Rain)
        .unwrap();
    assert_eq!(rain.ticks, 5);
    assert_eq!(rain.payload.as_str(), "0.330000");
    assert_eq!(sink.payloads_for("weatherstation/rain"), vec!["0.330000"]);
}

#[test]
fn overshoot_does_not_accumulate_drift() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 600);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0).with_jitter([20_000, 0, 3_000]);
    let mut sink = RecordingSink::new();

    let elapsed: Vec<u64> = (0..3)
        .map(|_| s.run_once(&mut clock, &mut sink)[0].elapsed_us)
        .collect();
    assert_eq!(elapsed, vec![5_020_000, 5_000_000, 5_003_000]);
    assert_eq!(clock.sleeps, vec![5_000_000, 10_020_000, 15_020_000]);
    assert_eq!(s.window(WindowId::Wind).next_deadline_us(), 20_023_000);
}

#[test]
fn quiet_window_publishes_zero() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 600);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();

    s.run_once(&mut clock, &mut sink);
    assert_eq!(sink.payloads_for("weatherstation/wind"), vec!["0.000000"]);
}

#[test]
fn edges_after_a_drain_count_toward_the_next_window() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 600);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();

    d.on_edge(ANEMOMETER_PIN, 1_000_000);
    assert_eq!(s.run_once(&mut clock, &mut sink)[0].ticks, 1);

    d.on_edge(ANEMOMETER_PIN, 5_500_000);
    d.on_edge(ANEMOMETER_PIN, 6_500_000);
    assert_eq!(s.run_once(&mut clock, &mut sink)[0].ticks, 2);
}

#[test]
fn unknown_pins_never_reach_a_counter() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 5);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0);
    let mut sink = RecordingSink::new();

    assert_eq!(d.on_edge(2, 1_000_000), EdgeOutcome::UnknownPin);
    assert_eq!(d.on_edge(27, 2_000_000), EdgeOutcome::UnknownPin);

    let reports = s.run_once(&mut clock, &mut sink);
    assert!(reports.iter().all(|r| r.ticks == 0));
    assert_eq!(d.take_unknown(), None);
}

#[test]
fn failing_sink_keeps_the_schedule_moving() {
    let d = dispatcher(5_000, 5_000);
    let cfg = config(5, 600);
    let mut s = FlushScheduler::new(0, &d, &cfg, TOPICS);
    let mut clock = ManualClock::new(0);
    let mut sink = FailingSink::default();

    for cycle in 1..=10u64 {
        let edge_at = cycle * 5_000_000 - 1_000_000;
        d.on_edge(ANEMOMETER_PIN, edge_at);

        let reports = s.run_once(&mut clock, &mut sink);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].ticks, 1, "cycle {cycle}");
        assert!(!reports[0].published());
        assert_eq!(
            s.window(WindowId::Wind).next_deadline_us(),
            (cycle + 1) * 5_000_000
        );
    }
    assert_eq!(sink.attempts, 10);
    assert_eq!(s.publish_failures(), 10);
}

#[test]
fn default_config_debounce_filters_fast_rain_bounces() {
    let cfg = StationConfig::default();
    let d = EdgeDispatcher::new(ANEMOMETER_PIN, RAIN_PIN, SensorCounters::from_config(&cfg));

    assert_eq!(d.on_edge(RAIN_PIN, 1_000_000), EdgeOutcome::Counted);
    // One bucket tip cannot follow another within 6.6 s at 6 in/h.
    assert_eq!(d.on_edge(RAIN_PIN, 7_000_000), EdgeOutcome::Debounced);
    assert_eq!(d.on_edge(RAIN_PIN, 7_600_001), EdgeOutcome::Counted);
    assert_eq!(d.counters().rain_gauge.pending(), 2);
}
