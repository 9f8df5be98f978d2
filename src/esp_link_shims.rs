//! ESP-IDF runtime symbol providers for third-party crates.
//!
//! `critical-section` 1.x resolves its acquire/release at link time.  On
//! the device they enter an ISR-masking spinlock section, so the counter
//! drain in the flush scheduler cannot interleave with the pulse ISRs on
//! the same core and is serialised against the other core.  Host builds
//! link the `std` implementation instead.

#[cfg(target_os = "espidf")]
use core::cell::{Cell, RefCell};

#[cfg(target_os = "espidf")]
use esp_idf_hal::interrupt::{IsrCriticalSection, IsrCriticalSectionGuard};

#[cfg(target_os = "espidf")]
static ISR_CRITICAL_SECTION: IsrCriticalSection = IsrCriticalSection::new();

#[cfg(target_os = "espidf")]
thread_local! {
    static CRITICAL_SECTION_DEPTH: Cell<u8> = const { Cell::new(0) };
    static CRITICAL_SECTION_GUARD: RefCell<Option<IsrCriticalSectionGuard<'static>>> =
        const { RefCell::new(None) };
}

/// Interrupt-masking acquire used by `critical-section` 1.x.  Nested
/// acquires on one task only bump the depth.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        CRITICAL_SECTION_GUARD.with(|guard| {
            let d = depth.get();
            if d == 0 {
                *guard.borrow_mut() = Some(ISR_CRITICAL_SECTION.enter());
            }
            let new_depth = d.saturating_add(1);
            depth.set(new_depth);
            new_depth
        })
    })
}

/// Release matching [`_critical_section_1_0_acquire`]; interrupts are
/// restored when the outermost section ends.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    CRITICAL_SECTION_DEPTH.with(|depth| {
        CRITICAL_SECTION_GUARD.with(|guard| {
            let d = depth.get();
            if d == 0 {
                return;
            }
            let new_depth = d - 1;
            depth.set(new_depth);
            if new_depth == 0 {
                *guard.borrow_mut() = None;
            }
        })
    })
}
