//! Hardware initialisation, task placement and the watchdog.

pub mod hw_init;
pub mod task_pin;
pub mod watchdog;
