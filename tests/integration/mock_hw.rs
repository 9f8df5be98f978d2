//! Mock clock, sinks, broker and ADC for integration tests.
//!
//! Records every publish and every sleep so tests can assert on the full
//! history without touching timers, GPIO or the network.

use std::collections::VecDeque;

use weatherstation::app::ports::{
    ACK_BATCH, AdcSource, DeliverySink, MessageId, MonotonicClock, ReportSink,
};
use weatherstation::error::{CommsError, SensorError};

// ── ManualClock ───────────────────────────────────────────────

/// Clock that jumps to the requested deadline plus a queued overshoot.
pub struct ManualClock {
    pub now: u64,
    /// Overshoot applied to successive sleeps; zero once exhausted.
    pub jitter: VecDeque<u64>,
    pub sleeps: Vec<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now,
            jitter: VecDeque::new(),
            sleeps: Vec::new(),
        }
    }

    pub fn with_jitter(mut self, jitter: impl IntoIterator<Item = u64>) -> Self {
        self.jitter.extend(jitter);
        self
    }
}

impl MonotonicClock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now
    }

    fn sleep_until(&mut self, deadline_us: u64) {
        self.sleeps.push(deadline_us);
        let lag = self.jitter.pop_front().unwrap_or(0);
        self.now = self.now.max(deadline_us) + lag;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub published: Vec<(String, String)>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads_for(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }

    pub fn topics(&self) -> Vec<&str> {
        self.published.iter().map(|(t, _)| t.as_str()).collect()
    }
}

impl ReportSink for RecordingSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        self.published.push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

// ── FailingSink ───────────────────────────────────────────────

/// Rejects every publish, counting attempts.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub attempts: usize,
}

impl ReportSink for FailingSink {
    fn publish(&mut self, _topic: &str, _payload: &str) -> Result<(), CommsError> {
        self.attempts += 1;
        Err(CommsError::NotConnected)
    }
}

// ── MockBroker ────────────────────────────────────────────────

/// QoS 1 transport.  Every send is accepted into the outbox; only while
/// `reachable` does the broker acknowledge it.  `rejecting` fails the send
/// itself, as a client with a full outbox does.
#[derive(Debug)]
pub struct MockBroker {
    pub reachable: bool,
    pub rejecting: bool,
    pub outbox: Vec<(MessageId, String, String)>,
    pending_acks: Vec<MessageId>,
    next_id: MessageId,
}

impl MockBroker {
    pub fn reachable() -> Self {
        Self {
            reachable: true,
            rejecting: false,
            outbox: Vec::new(),
            pending_acks: Vec::new(),
            next_id: 1,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::reachable()
        }
    }

    pub fn topics(&self) -> Vec<&str> {
        self.outbox.iter().map(|(_, t, _)| t.as_str()).collect()
    }

    pub fn payloads_for(&self, topic: &str) -> Vec<&str> {
        self.outbox
            .iter()
            .filter(|(_, t, _)| t == topic)
            .map(|(_, _, p)| p.as_str())
            .collect()
    }
}

impl DeliverySink for MockBroker {
    fn send(&mut self, topic: &str, payload: &str) -> Result<MessageId, CommsError> {
        if self.rejecting {
            return Err(CommsError::PublishFailed);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.outbox.push((id, topic.to_string(), payload.to_string()));
        if self.reachable {
            self.pending_acks.push(id);
        }
        Ok(id)
    }

    fn take_acks(&mut self) -> heapless::Vec<MessageId, ACK_BATCH> {
        self.pending_acks.drain(..).take(ACK_BATCH).collect()
    }
}

// ── ScriptedAdc ───────────────────────────────────────────────

/// Returns queued readings in order, then `AdcReadFailed`.
pub struct ScriptedAdc {
    pub readings: VecDeque<Result<u16, SensorError>>,
}

#[allow(dead_code)]
impl ScriptedAdc {
    pub fn new(readings: impl IntoIterator<Item = Result<u16, SensorError>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }
}

impl AdcSource for ScriptedAdc {
    fn read(&mut self) -> Result<u16, SensorError> {
        self.readings
            .pop_front()
            .unwrap_or(Err(SensorError::AdcReadFailed))
    }
}

