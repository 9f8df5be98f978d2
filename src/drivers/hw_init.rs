//! One-shot hardware peripheral initialization.
//!
//! Configures the vane's ADC1 channel, the two reed-switch inputs, and the
//! per-pin GPIO ISR service using raw ESP-IDF sys calls.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::error::SensorError;
use crate::sensors::EdgeDispatcher;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed { pin: i32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed { pin, rc } => {
                write!(f, "GPIO{} ISR handler add failed (rc={})", pin, rc)
            }
        }
    }
}

impl std::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        let what = match e {
            HwInitError::AdcInitFailed(_) => "adc1",
            HwInitError::GpioConfigFailed(_) => "gpio inputs",
            HwInitError::IsrInstallFailed(_) => "gpio isr service",
            HwInitError::IsrHandlerFailed { .. } => "gpio isr handler",
        };
        Self::Init(what)
    }
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: the handle is written once by `init_adc()` before the direction
/// task is spawned; only that task reads through it afterwards.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

/// Configure ADC1 with the vane channel at 12 dB / 12 bit.
#[cfg(target_os = "espidf")]
pub fn init_adc(channel: u32) -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 CH{} configured (wind vane)", channel);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc(_channel: u32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; single reader.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, i32::from(u16::MAX)) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Result<u16, SensorError> {
    Err(SensorError::AdcReadFailed)
}

// ── Pulse inputs + ISRs ───────────────────────────────────────

/// Per-pin ISR argument.  Leaked at install time; lives forever.
#[cfg(target_os = "espidf")]
struct PinBinding {
    pin: i32,
    dispatcher: &'static EdgeDispatcher,
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pulse_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the leaked `PinBinding` registered for this pin.
    let binding = unsafe { &*(arg as *const PinBinding) };
    // Atomics only; no logging or allocation in ISR context.
    let _ = binding
        .dispatcher
        .on_edge(binding.pin, crate::adapters::time::isr_now_us());
}

/// Configure both reed-switch pins as pulled-up inputs and register a
/// falling-edge ISR on each that feeds `dispatcher`.
///
/// Interrupts are allocated on the calling core, so call this from the
/// thread that will run the flush scheduler.
#[cfg(target_os = "espidf")]
pub fn install_pulse_isrs(dispatcher: &'static EdgeDispatcher) -> Result<(), HwInitError> {
    use crate::sensors::PulseSensor;

    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.
    let ret = unsafe { gpio_install_isr_service(0) };
    if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
        return Err(HwInitError::IsrInstallFailed(ret));
    }

    for sensor in [PulseSensor::Anemometer, PulseSensor::RainGauge] {
        let pin = dispatcher.pin_for(sensor);
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }

        let binding: &'static PinBinding = Box::leak(Box::new(PinBinding { pin, dispatcher }));
        // SAFETY: the handler only touches atomics through a 'static binding.
        let ret = unsafe {
            gpio_isr_handler_add(
                pin,
                Some(pulse_gpio_isr),
                binding as *const PinBinding as *mut core::ffi::c_void,
            )
        };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrHandlerFailed { pin, rc: ret });
        }
        unsafe { gpio_intr_enable(pin) };
    }

    info!(
        "hw_init: pulse ISRs on GPIO{} (anemometer), GPIO{} (rain gauge)",
        dispatcher.pin_for(PulseSensor::Anemometer),
        dispatcher.pin_for(PulseSensor::RainGauge)
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn install_pulse_isrs(_dispatcher: &'static EdgeDispatcher) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
