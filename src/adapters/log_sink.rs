//! Log-based delivery sink adapter.
//!
//! Implements [`DeliverySink`] by writing each report to the logger (UART /
//! USB-CDC on the device, stderr in host simulation).  The firmware falls
//! back to it when `MQTT_HOST` is not set at build time.  A log line
//! cannot be lost in transit, so every send is acknowledged immediately.

use heapless::Vec;
use log::info;

use crate::app::ports::{ACK_BATCH, DeliverySink, MessageId};
use crate::error::CommsError;

/// Adapter that logs every report to the serial console.
#[derive(Debug, Default)]
pub struct LogSink {
    next_id: MessageId,
    acked: Vec<MessageId, ACK_BATCH>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports logged so far.
    pub fn published(&self) -> u64 {
        u64::from(self.next_id)
    }
}

impl DeliverySink for LogSink {
    fn send(&mut self, topic: &str, payload: &str) -> Result<MessageId, CommsError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        info!("REPORT | {} = {}", topic, payload);
        if self.acked.is_full() {
            self.acked.remove(0);
        }
        let _ = self.acked.push(id);
        Ok(id)
    }

    fn take_acks(&mut self) -> Vec<MessageId, ACK_BATCH> {
        core::mem::take(&mut self.acked)
    }
}
