//! Bounded report queue between the sensor tasks and the MQTT publisher.
//!
//! Uses an `embassy-sync` bounded MPMC channel so the flush scheduler never
//! blocks on network I/O: it enqueues and moves on.  The main task drains
//! the queue through a [`Publisher`] and owns the broker connection.
//!
//! ```text
//! ┌───────────────┐            ┌──────────────┐
//! │ wind_and_rain │──┐         │              │
//! └───────────────┘  │ Outbound │  publisher   │──▶ MQTT
//! ┌───────────────┐  ├────────▶│  (main task) │
//! │   wind_dir    │──┘  Report └──────────────┘
//! └───────────────┘
//! ```

use core::fmt::Write;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use log::warn;

use crate::app::ports::{DeliverySink, MessageId, ReportSink};
use crate::error::CommsError;

/// Longest state topic the queue carries.
pub const TOPIC_CAPACITY: usize = 96;
/// Longest payload the queue carries.
pub const PAYLOAD_CAPACITY: usize = 32;

/// Queue depth.  Both windows plus a direction sample fit several times over.
pub const REPORT_DEPTH: usize = 8;

/// One publish waiting for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReport {
    pub topic: String<TOPIC_CAPACITY>,
    pub payload: String<PAYLOAD_CAPACITY>,
}

impl OutboundReport {
    pub fn new(topic: &str, payload: &str) -> Result<Self, CommsError> {
        let mut r = Self {
            topic: String::new(),
            payload: String::new(),
        };
        r.topic
            .write_str(topic)
            .map_err(|_| CommsError::PayloadTooLong)?;
        r.payload
            .write_str(payload)
            .map_err(|_| CommsError::PayloadTooLong)?;
        Ok(r)
    }
}

pub type ReportQueue = Channel<CriticalSectionRawMutex, OutboundReport, REPORT_DEPTH>;

/// Process-wide queue used by the firmware binary.
pub static REPORT_QUEUE: ReportQueue = Channel::new();

// ── Producer side ─────────────────────────────────────────────

/// [`ReportSink`] that enqueues without blocking.  A full queue is reported
/// as [`CommsError::QueueFull`] and the report is dropped.
#[derive(Clone, Copy)]
pub struct QueueSink<'a> {
    queue: &'a ReportQueue,
}

impl<'a> QueueSink<'a> {
    pub fn new(queue: &'a ReportQueue) -> Self {
        Self { queue }
    }
}

impl ReportSink for QueueSink<'_> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        let report = OutboundReport::new(topic, payload)?;
        self.queue
            .try_send(report)
            .map_err(|_| CommsError::QueueFull)
    }
}

// ── Consumer side ─────────────────────────────────────────────

/// Watched sends awaiting a broker acknowledgement.  When full the oldest
/// is forgotten; that only happens while the broker is not acknowledging.
pub const OUTSTANDING_DEPTH: usize = 8;

/// Block until a report is queued.
pub fn next_report(queue: &ReportQueue) -> OutboundReport {
    futures_lite::future::block_on(queue.receive())
}

/// Drains the queue into a [`DeliverySink`] and counts confirmed
/// deliveries of the watched topics.
///
/// Only an acknowledged delivery of a watched topic is proof of life: a
/// transport that accepts messages without the broker confirming them, or
/// a queue that only carries unwatched topics, yields no deliveries.
pub struct Publisher<'a> {
    queue: &'a ReportQueue,
    watched: &'a [&'a str],
    outstanding: Vec<MessageId, OUTSTANDING_DEPTH>,
}

impl<'a> Publisher<'a> {
    pub fn new(queue: &'a ReportQueue, watched: &'a [&'a str]) -> Self {
        Self {
            queue,
            watched,
            outstanding: Vec::new(),
        }
    }

    /// Watched sends not yet acknowledged.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Forward one report, blocking until one is queued, then settle
    /// acknowledgements.  Returns the number of watched deliveries the
    /// broker confirmed.
    pub fn step<S: DeliverySink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let report = next_report(self.queue);
        self.forward(&report, sink);
        self.settle(sink)
    }

    /// Forward everything currently queued without blocking, then settle.
    pub fn drain_pending<S: DeliverySink + ?Sized>(&mut self, sink: &mut S) -> usize {
        while let Ok(report) = self.queue.try_receive() {
            self.forward(&report, sink);
        }
        self.settle(sink)
    }

    fn forward<S: DeliverySink + ?Sized>(&mut self, report: &OutboundReport, sink: &mut S) {
        match sink.send(&report.topic, &report.payload) {
            Ok(id) if self.is_watched(&report.topic) => {
                if self.outstanding.is_full() {
                    self.outstanding.remove(0);
                }
                let _ = self.outstanding.push(id);
            }
            Ok(_) => {}
            Err(e) => warn!("publisher: '{}' dropped: {}", report.topic, e),
        }
    }

    fn is_watched(&self, topic: &str) -> bool {
        self.watched.iter().any(|t| *t == topic)
    }

    /// Match acknowledgements against outstanding watched sends.
    pub fn settle<S: DeliverySink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let mut delivered = 0;
        for id in sink.take_acks() {
            if let Some(pos) = self.outstanding.iter().position(|&o| o == id) {
                self.outstanding.remove(pos);
                delivered += 1;
            }
        }
        delivered
    }

    /// Forward forever.  `on_delivered` runs after every step that
    /// confirmed at least one watched delivery; the firmware feeds the
    /// watchdog there.
    pub fn run<S, F>(mut self, sink: &mut S, mut on_delivered: F) -> !
    where
        S: DeliverySink + ?Sized,
        F: FnMut(),
    {
        loop {
            if self.step(sink) > 0 {
                on_delivered();
            }
        }
    }
}
