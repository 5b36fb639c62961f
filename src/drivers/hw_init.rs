//! One-shot GPIO configuration and raw pin helpers.
//!
//! Configures the heater SSR and cooling relay as outputs (driven LOW) and
//! the run switch as a pulled-up input, using raw ESP-IDF sys calls.
//! Called once from `main()` before the application starts.
//!
//! On host builds the pins are a simulated level bitmask so drivers that
//! sit on top of these helpers stay testable.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    TimerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::TimerFailed(rc) => write!(f, "esp_timer setup failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── Init ──────────────────────────────────────────────────────

#[cfg(feature = "espidf")]
pub fn init_gpio() -> Result<(), HwInitError> {
    // SAFETY: called once from main() before any driver touches these pins.
    unsafe {
        for pin in [pins::HEATER_SSR_GPIO, pins::COOLING_RELAY_GPIO] {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            let ret = gpio_config(&cfg);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::GpioConfigFailed(ret));
            }
            gpio_set_level(pin, 0);
        }

        let run_cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pins::RUN_SWITCH_GPIO,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = gpio_config(&run_cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    log::info!("hw_init: heater/relay outputs LOW, run switch input");
    Ok(())
}

#[cfg(not(feature = "espidf"))]
pub fn init_gpio() -> Result<(), HwInitError> {
    sim::reset();
    for pin in [pins::HEATER_SSR_GPIO, pins::COOLING_RELAY_GPIO] {
        gpio_write(pin, false);
    }
    log::info!("hw_init(sim): GPIO levels reset");
    Ok(())
}

// ── Pin access ────────────────────────────────────────────────

#[cfg(feature = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(feature = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::level(pin)
}

#[cfg(feature = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as an output in init_gpio(); gpio_set_level
    // is safe from both the main task and the esp_timer task.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(feature = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    sim::set_level(pin, high);
}

/// Simulated pin levels for host builds.  Unconfigured pins read HIGH, like
/// inputs with pull-ups.
#[cfg(not(feature = "espidf"))]
pub mod sim {
    use core::sync::atomic::{AtomicU64, Ordering};

    static LEVELS: AtomicU64 = AtomicU64::new(u64::MAX);

    pub fn reset() {
        LEVELS.store(u64::MAX, Ordering::SeqCst);
    }

    pub fn level(pin: i32) -> bool {
        LEVELS.load(Ordering::SeqCst) & (1u64 << pin) != 0
    }

    pub fn set_level(pin: i32, high: bool) {
        if high {
            LEVELS.fetch_or(1u64 << pin, Ordering::SeqCst);
        } else {
            LEVELS.fetch_and(!(1u64 << pin), Ordering::SeqCst);
        }
    }
}
