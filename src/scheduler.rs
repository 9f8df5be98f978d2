//! Dual-window flush scheduler.
//!
//! Two independent periodic windows drain the pulse counters: a short one
//! for wind speed and a long one for rainfall.  The loop sleeps until the
//! earlier deadline, drains whatever is due, then converts and publishes.
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!   ┌────────────────┐   ┌──────────────────────────┐   ┌───┴──────────┐
//!   │ Sleep          │──▶│ Wake                     │──▶│ Report       │
//!   │ until min(     │   │ critical section:        │   │ rate → text  │
//!   │  wind, rain)   │   │  take_and_reset due ctrs │   │ sink.publish │
//!   └────────────────┘   │  elapsed = T + overshoot │   │ (IRQs on)    │
//!                        │  deadline = now + T      │   └──────────────┘
//!                        └──────────────────────────┘
//! ```
//!
//! Deadlines are re-armed from the wake instant, so drift never accumulates,
//! while the overshoot is folded into `elapsed` so the reported rate stays
//! unbiased.  Publishing happens after the critical section closes and its
//! failures never hold up the next cycle.

use heapless::Vec;
use log::{debug, info, warn};

use crate::app::events::{Flush, Report, WindowId};
use crate::app::ports::{MonotonicClock, ReportSink};
use crate::config::StationConfig;
use crate::rate::{RateConvention, RatePayload, RateSpec, format_rate};
use crate::sensors::{DebouncedCounter, EdgeDispatcher, PulseSensor};

/// Both windows can come due on the same wake.
pub const MAX_FLUSHES: usize = 2;

// ═══════════════════════════════════════════════════════════════
//  Window
// ═══════════════════════════════════════════════════════════════

/// One periodic window with a monotonic deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushWindow {
    id: WindowId,
    nominal_period_us: u64,
    next_deadline_us: u64,
}

impl FlushWindow {
    /// First deadline is one period after `now_us`.
    pub fn new(id: WindowId, nominal_period_us: u64, now_us: u64) -> Self {
        Self {
            id,
            nominal_period_us,
            next_deadline_us: now_us.saturating_add(nominal_period_us),
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn nominal_period_us(&self) -> u64 {
        self.nominal_period_us
    }

    pub fn next_deadline_us(&self) -> u64 {
        self.next_deadline_us
    }

    pub fn is_due(&self, now_us: u64) -> bool {
        self.next_deadline_us <= now_us
    }

    /// Re-arm one period after `now_us` and return how long the window that
    /// just closed actually lasted: the nominal period plus the overshoot
    /// past the old deadline.
    pub fn advance(&mut self, now_us: u64) -> u64 {
        let old_deadline = core::mem::replace(
            &mut self.next_deadline_us,
            now_us.saturating_add(self.nominal_period_us),
        );
        self.nominal_period_us + now_us.saturating_sub(old_deadline)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// State topics the two windows publish to.
#[derive(Debug, Clone, Copy)]
pub struct ReportTopics<'a> {
    pub wind: &'a str,
    pub rain: &'a str,
}

/// A window together with the counter it drains and how to convert it.
struct WindowBinding<'a> {
    window: FlushWindow,
    counter: &'a DebouncedCounter,
    rate: RateSpec,
    topic: &'a str,
}

impl WindowBinding<'_> {
    /// Drain the counter if the window is due.  Caller holds the critical
    /// section.
    fn drain_if_due(&mut self, now_us: u64) -> Option<Flush> {
        if !self.window.is_due(now_us) {
            return None;
        }
        let ticks = self.counter.take_and_reset();
        let elapsed_us = self.window.advance(now_us);
        Some(Flush {
            window: self.window.id(),
            ticks,
            elapsed_us,
        })
    }
}

/// Owns both windows and borrows the counters through the dispatcher the
/// GPIO ISRs feed.
pub struct FlushScheduler<'a> {
    dispatcher: &'a EdgeDispatcher,
    wind: WindowBinding<'a>,
    rain: WindowBinding<'a>,
    wakes: u64,
    publish_failures: u64,
}

impl<'a> FlushScheduler<'a> {
    pub fn new(
        now_us: u64,
        dispatcher: &'a EdgeDispatcher,
        cfg: &StationConfig,
        topics: ReportTopics<'a>,
    ) -> Self {
        let counters = dispatcher.counters();
        Self {
            dispatcher,
            wind: WindowBinding {
                window: FlushWindow::new(WindowId::Wind, cfg.wind_window_us(), now_us),
                counter: counters.get(PulseSensor::Anemometer),
                rate: RateSpec::new(
                    f64::from(cfg.anemometer_mph_per_tick),
                    RateConvention::Direct,
                ),
                topic: topics.wind,
            },
            rain: WindowBinding {
                window: FlushWindow::new(WindowId::Rain, cfg.rain_window_us(), now_us),
                counter: counters.get(PulseSensor::RainGauge),
                rate: RateSpec::new(
                    f64::from(cfg.rain_gauge_inches_per_tick),
                    RateConvention::PerHour,
                ),
                topic: topics.rain,
            },
            wakes: 0,
            publish_failures: 0,
        }
    }

    pub fn window(&self, id: WindowId) -> &FlushWindow {
        &self.binding(id).window
    }

    /// Earlier of the two deadlines.
    pub fn next_wake(&self) -> u64 {
        self.wind
            .window
            .next_deadline_us()
            .min(self.rain.window.next_deadline_us())
    }

    /// Completed wake-ups.
    pub fn wakes(&self) -> u64 {
        self.wakes
    }

    /// Reports the sink rejected since boot.
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures
    }

    /// Drain every window due at `now_us`.
    ///
    /// All due windows are drained inside one critical section, so when
    /// both deadlines have passed the interrupt-masked region is entered
    /// only once.
    pub fn collect_due(&mut self, now_us: u64) -> Vec<Flush, MAX_FLUSHES> {
        let wind = &mut self.wind;
        let rain = &mut self.rain;
        critical_section::with(|_cs| {
            let mut flushes = Vec::new();
            for binding in [wind, rain] {
                if let Some(flush) = binding.drain_if_due(now_us) {
                    // Capacity equals the number of windows.
                    let _ = flushes.push(flush);
                }
            }
            flushes
        })
    }

    /// Convert each flush to a rate and publish it.  Must run outside the
    /// critical section.  A failed publish is logged and counted; it never
    /// touches counter or deadline state.
    pub fn report<S: ReportSink + ?Sized>(
        &mut self,
        flushes: &[Flush],
        sink: &mut S,
    ) -> Vec<Report, MAX_FLUSHES> {
        let mut reports = Vec::new();
        for flush in flushes {
            let binding = self.binding(flush.window);
            let value = binding.rate.rate(flush.ticks, flush.elapsed_us);
            let topic = binding.topic;

            info!(
                "{}: collected {} ticks over {:.3}s, {:.1} {}",
                flush.window.label(),
                flush.ticks,
                flush.elapsed_us as f64 / 1e6,
                value,
                flush.window.unit(),
            );

            let (payload, result) = match format_rate(value) {
                Ok(payload) => {
                    let result = sink.publish(topic, &payload);
                    (payload, result)
                }
                Err(e) => (RatePayload::new(), Err(e)),
            };
            if let Err(e) = result {
                self.publish_failures += 1;
                warn!("{}: publish to '{}' failed: {}", flush.window.label(), topic, e);
            }

            let _ = reports.push(Report {
                window: flush.window,
                ticks: flush.ticks,
                elapsed_us: flush.elapsed_us,
                value,
                payload,
                result,
            });
        }
        reports
    }

    /// One Sleep → Wake → Report cycle.
    pub fn run_once<C, S>(&mut self, clock: &mut C, sink: &mut S) -> Vec<Report, MAX_FLUSHES>
    where
        C: MonotonicClock + ?Sized,
        S: ReportSink + ?Sized,
    {
        let target = self.next_wake();
        debug!(
            "scheduler: sleeping for {} usec",
            target.saturating_sub(clock.now_us())
        );
        clock.sleep_until(target);

        let now = clock.now_us();
        self.wakes += 1;
        self.log_unknown_edges();

        let flushes = self.collect_due(now);
        self.report(&flushes, sink)
    }

    /// Run forever.
    pub fn run<C, S>(mut self, clock: &mut C, sink: &mut S) -> !
    where
        C: MonotonicClock + ?Sized,
        S: ReportSink + ?Sized,
    {
        info!(
            "scheduler: wind every {}s, rain every {}s",
            self.wind.window.nominal_period_us() / 1_000_000,
            self.rain.window.nominal_period_us() / 1_000_000,
        );
        loop {
            self.run_once(clock, sink);
        }
    }

    fn binding(&self, id: WindowId) -> &WindowBinding<'a> {
        match id {
            WindowId::Wind => &self.wind,
            WindowId::Rain => &self.rain,
        }
    }

    fn log_unknown_edges(&self) {
        if let Some(unknown) = self.dispatcher.take_unknown() {
            warn!(
                "scheduler: dropped {} edge(s) from unexpected gpio (last: {})",
                unknown.count, unknown.last_pin
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
