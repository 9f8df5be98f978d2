//! Fuzz target: `EdgeDispatcher::on_edge` + `FlushScheduler::collect_due`
//!
//! Decodes the input into a stream of `(pin, timestamp delta)` edges,
//! interleaved with scheduler wakes, and asserts that every counted tick
//! is drained exactly once and that no two counted edges on one sensor are
//! closer than its debounce interval.
//!
//! cargo fuzz run fuzz_edge_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use weatherstation::config::StationConfig;
use weatherstation::scheduler::{FlushScheduler, ReportTopics};
use weatherstation::sensors::{EdgeDispatcher, EdgeOutcome, SensorCounters};

const ANEMOMETER: i32 = 14;
const RAIN: i32 = 15;

fuzz_target!(|data: &[u8]| {
    let cfg = StationConfig {
        wind_report_period_secs: 1,
        rain_report_period_secs: 3,
        ..StationConfig::default()
    };
    let anemometer_debounce = 2_000;
    let rain_debounce = 50_000;
    let d = EdgeDispatcher::new(
        ANEMOMETER,
        RAIN,
        SensorCounters::new(anemometer_debounce, rain_debounce),
    );
    let mut s = FlushScheduler::new(0, &d, &cfg, ReportTopics { wind: "w", rain: "r" });

    let mut now = 0u64;
    let mut counted = [0u64; 2];
    let mut drained = [0u64; 2];
    let mut last_counted: [Option<u64>; 2] = [None, None];

    for chunk in data.chunks_exact(3) {
        let pin = match chunk[0] % 4 {
            0 => ANEMOMETER,
            1 => RAIN,
            2 => i32::from(chunk[0]),
            _ => {
                // Scheduler wake at the current time.
                for f in s.collect_due(now) {
                    drained[f.window as usize] += u64::from(f.ticks);
                }
                continue;
            }
        };
        now += u64::from(u16::from_le_bytes([chunk[1], chunk[2]])) * 10;

        let outcome = d.on_edge(pin, now);
        let idx = match pin {
            ANEMOMETER => 0,
            RAIN => 1,
            _ => {
                assert_eq!(outcome, EdgeOutcome::UnknownPin);
                continue;
            }
        };
        if outcome == EdgeOutcome::Counted {
            let debounce = if idx == 0 { anemometer_debounce } else { rain_debounce };
            if let Some(prev) = last_counted[idx] {
                assert!(now > prev + debounce, "counted inside debounce window");
            }
            last_counted[idx] = Some(now);
            counted[idx] += 1;
        }
    }

    // Final drain far in the future picks up every remaining tick.
    for f in s.collect_due(now + 10_000_000) {
        drained[f.window as usize] += u64::from(f.ticks);
    }
    assert_eq!(counted, drained, "ticks lost or duplicated");
});
