//! Monotonic clock adapter.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//!   The same counter timestamps edges in the GPIO ISRs, so deadlines and
//!   debounce share one time base.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side simulation.

use core::time::Duration;

use crate::app::ports::MonotonicClock;

/// Microsecond clock since boot.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

/// Edge timestamp for use inside an ISR.
#[cfg(target_os = "espidf")]
#[inline(always)]
pub fn isr_now_us() -> u64 {
    // SAFETY: esp_timer_get_time reads the systimer counter; ISR-safe.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
}

impl MonotonicClock for SystemClock {
    #[cfg(target_os = "espidf")]
    fn now_us(&self) -> u64 {
        isr_now_us()
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// `thread::sleep` never returns early, so re-checking once is enough to
    /// cover tick rounding on FreeRTOS.
    fn sleep_until(&mut self, deadline_us: u64) {
        loop {
            let now = self.now_us();
            if now >= deadline_us {
                return;
            }
            std::thread::sleep(Duration::from_micros(deadline_us - now));
        }
    }
}

/// `embedded-hal` delay backed by the thread scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl embedded_hal::delay::DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
