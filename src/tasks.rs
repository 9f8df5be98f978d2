//! Long-running task bodies.
//!
//! | Task            | Core | Drives                                |
//! |-----------------|------|---------------------------------------|
//! | `wind_and_rain` | App  | [`FlushScheduler`] over the counters  |
//! | `wind_dir`      | any  | [`WindVane`] sampled every wind period |
//!
//! Both publish through a [`ReportSink`]; neither touches MQTT directly.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{AdcSource, MonotonicClock, ReportSink};
use crate::config::StationConfig;
use crate::error::Error;
use crate::scheduler::{FlushScheduler, ReportTopics};
use crate::sensors::{EdgeDispatcher, VaneReading, WindVane};

/// Run the dual-window flush loop forever.
///
/// The GPIO ISRs must already be feeding `dispatcher`; on the device they
/// are installed from this same thread so the interrupt-masked drain and
/// the ISRs share a core.
pub fn run_wind_and_rain<C, S>(
    dispatcher: &EdgeDispatcher,
    cfg: &StationConfig,
    topics: ReportTopics<'_>,
    clock: &mut C,
    sink: &mut S,
) -> !
where
    C: MonotonicClock + ?Sized,
    S: ReportSink + ?Sized,
{
    let scheduler = FlushScheduler::new(clock.now_us(), dispatcher, cfg, topics);
    scheduler.run(clock, sink)
}

// ── Wind direction ────────────────────────────────────────────

/// Sample the vane once and publish its label.
pub fn sample_direction<A, S>(
    vane: &mut WindVane<A>,
    sink: &mut S,
    topic: &str,
) -> Result<VaneReading, Error>
where
    A: AdcSource,
    S: ReportSink + ?Sized,
{
    let reading = vane.sample()?;
    debug!("wind_dir: raw={} -> {}", reading.raw, reading.direction);
    sink.publish(topic, reading.direction)?;
    Ok(reading)
}

/// Sample, publish, sleep `period_ms`, forever.  A failed sample or publish
/// is logged and the loop carries on.
pub fn run_direction_loop<A, S, D>(
    mut vane: WindVane<A>,
    sink: &mut S,
    topic: &str,
    mut delay: D,
    period_ms: u32,
) -> !
where
    A: AdcSource,
    S: ReportSink + ?Sized,
    D: DelayNs,
{
    info!("wind_dir: sampling every {} ms", period_ms);
    loop {
        if let Err(e) = sample_direction(&mut vane, sink, topic) {
            warn!("wind_dir: {}", e);
        }
        delay.delay_ms(period_ms);
    }
}
