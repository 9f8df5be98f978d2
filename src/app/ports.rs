//! Port traits: the boundary between the counting/flush core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ scheduler / task loops
//! ```
//!
//! Driven adapters (clock, publisher, ADC) implement these traits.  The
//! [`FlushScheduler`](crate::scheduler::FlushScheduler) and the task loops
//! consume them via generics, so the core never touches hardware directly
//! and runs unchanged against the mocks in `tests/integration/mock_hw.rs`.

use crate::error::{CommsError, SensorError};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic microsecond clock with an absolute sleep.
pub trait MonotonicClock {
    /// Microseconds since boot.
    fn now_us(&self) -> u64;

    /// Block until `deadline_us`.  Must return at or after the deadline,
    /// never before; returning later is tolerated.
    fn sleep_until(&mut self, deadline_us: u64);
}

// ───────────────────────────────────────────────────────────────
// Reporting sink (domain → pub/sub)
// ───────────────────────────────────────────────────────────────

/// Pub/sub publish.  Failures are non-fatal to the caller: they are logged
/// and the next report attempt is independent.  Retry, if any, belongs to
/// the implementation.
pub trait ReportSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        (**self).publish(topic, payload)
    }
}

/// Transport-assigned id of one outbound message.
pub type MessageId = u32;

/// Transport whose deliveries are acknowledged asynchronously by the far
/// end (MQTT QoS 1 PUBACK).  Handing a message over is not delivery; only
/// an id returned by [`take_acks`](Self::take_acks) counts.
pub trait DeliverySink {
    /// Hand `payload` to the transport.  Returns the id its
    /// acknowledgement will carry.
    fn send(&mut self, topic: &str, payload: &str) -> Result<MessageId, CommsError>;

    /// Ids acknowledged since the previous call, oldest first.
    fn take_acks(&mut self) -> heapless::Vec<MessageId, ACK_BATCH>;
}

/// Most acknowledgements reported by one [`DeliverySink::take_acks`] call.
pub const ACK_BATCH: usize = 16;

impl<S: DeliverySink + ?Sized> DeliverySink for &mut S {
    fn send(&mut self, topic: &str, payload: &str) -> Result<MessageId, CommsError> {
        (**self).send(topic, payload)
    }

    fn take_acks(&mut self) -> heapless::Vec<MessageId, ACK_BATCH> {
        (**self).take_acks()
    }
}

// ───────────────────────────────────────────────────────────────
// ADC sample source (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Polled single-channel ADC.
pub trait AdcSource {
    fn read(&mut self) -> Result<u16, SensorError>;
}
