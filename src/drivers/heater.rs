//! Slow (time-proportioned) PWM for the heater solid-state relay.
//!
//! A zero-crossing SSR cannot follow kHz PWM, so the duty is spread over a
//! long window instead:
//!
//! ```text
//!   duty 40%, window 1500 ms
//!   ┌──────────┐                ┌──────────┐
//!   │   600 ms │     900 ms     │          │
//! ──┘          └────────────────┘          └──── …
//! ```
//!
//! On-times shorter than the relay's minimum switch-on time are dropped to
//! zero; off-times shorter than its minimum switch-off time are stretched
//! to full on.
//!
//! ## Dual-target design
//!
//! On ESP-IDF a 10 ms `esp_timer` evaluates the window and drives the SSR
//! pin, independent of the main loop.  On host the same evaluation is run
//! by calling [`HeaterDriver::tick`] directly.

use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;
use log::info;

use super::hw_init::{self, HwInitError};
use crate::pins;

/// SSR needs this long to switch on.
pub const MIN_ON_MS: u32 = 9;
/// SSR needs this long to switch off.
pub const MIN_OFF_MS: u32 = 10;
/// Resolution of the window evaluation.
pub const TICK_MS: u32 = 10;

/// Duty shared between the main task and the timer callback.
static HEATER_DUTY: AtomicU8 = AtomicU8::new(0);

/// Window arithmetic, kept free of hardware for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlowPwm {
    period_ms: u32,
    min_on_ms: u32,
    min_off_ms: u32,
}

impl SlowPwm {
    pub fn new(period_ms: u32, min_on_ms: u32, min_off_ms: u32) -> Self {
        Self {
            period_ms: period_ms.max(1),
            min_on_ms,
            min_off_ms,
        }
    }

    /// On-time within one window for `duty` percent.
    pub fn on_time_ms(&self, duty: u8) -> u32 {
        let on = self.period_ms * u32::from(duty.min(100)) / 100;
        if on < self.min_on_ms {
            0
        } else if self.period_ms - on < self.min_off_ms {
            self.period_ms
        } else {
            on
        }
    }

    /// Output level at absolute time `now_ms`.
    pub fn level(&self, duty: u8, now_ms: u64) -> bool {
        let phase = (now_ms % u64::from(self.period_ms)) as u32;
        phase < self.on_time_ms(duty)
    }
}

pub struct HeaterDriver {
    pwm: SlowPwm,
    #[cfg(feature = "espidf")]
    timer: esp_timer_handle_t,
}

impl HeaterDriver {
    /// Start the window timer with the heater off.
    #[cfg(feature = "espidf")]
    pub fn start(period_ms: u32) -> Result<Self, HwInitError> {
        let pwm = SlowPwm::new(period_ms, MIN_ON_MS, MIN_OFF_MS);
        HEATER_DUTY.store(0, Ordering::SeqCst);
        // Leaked so the callback's argument outlives the driver.
        let arg = Box::into_raw(Box::new(pwm));
        let mut timer: esp_timer_handle_t = core::ptr::null_mut();
        // SAFETY: `arg` is a leaked Box and stays valid for the program's
        // lifetime; `timer` is only touched from the main task.
        unsafe {
            let args = esp_timer_create_args_t {
                callback: Some(heater_tick_cb),
                arg: arg.cast(),
                dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
                name: c"heater".as_ptr(),
                skip_unhandled_events: true,
            };
            let ret = esp_timer_create(&args, &mut timer);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::TimerFailed(ret));
            }
            let ret = esp_timer_start_periodic(timer, u64::from(TICK_MS) * 1000);
            if ret != ESP_OK as i32 {
                return Err(HwInitError::TimerFailed(ret));
            }
        }
        info!("heater: slow PWM {period_ms} ms window started");
        Ok(Self { pwm, timer })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn start(period_ms: u32) -> Result<Self, HwInitError> {
        HEATER_DUTY.store(0, Ordering::SeqCst);
        info!("heater(sim): slow PWM {period_ms} ms window, driven by tick()");
        Ok(Self {
            pwm: SlowPwm::new(period_ms, MIN_ON_MS, MIN_OFF_MS),
        })
    }

    /// Duty in percent, clamped to 100.  Takes effect on the next tick.
    pub fn set_duty(&mut self, duty: u8) {
        HEATER_DUTY.store(duty.min(100), Ordering::SeqCst);
        if duty == 0 {
            hw_init::gpio_write(pins::HEATER_SSR_GPIO, false);
        }
    }

    pub fn duty(&self) -> u8 {
        HEATER_DUTY.load(Ordering::SeqCst)
    }

    /// Evaluate the window once and drive the SSR pin.
    pub fn tick(&self, now_ms: u64) {
        let level = self.pwm.level(self.duty(), now_ms);
        hw_init::gpio_write(pins::HEATER_SSR_GPIO, level);
    }
}

#[cfg(feature = "espidf")]
impl Drop for HeaterDriver {
    fn drop(&mut self) {
        // SAFETY: handle created in start(); stopped before the pin is forced low.
        unsafe {
            esp_timer_stop(self.timer);
        }
        HEATER_DUTY.store(0, Ordering::SeqCst);
        hw_init::gpio_write(pins::HEATER_SSR_GPIO, false);
    }
}

#[cfg(feature = "espidf")]
unsafe extern "C" fn heater_tick_cb(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the leaked SlowPwm from HeaterDriver::start().
    let pwm = unsafe { &*(arg as *const SlowPwm) };
    let now_ms = (unsafe { esp_timer_get_time() } / 1000) as u64;
    let level = pwm.level(HEATER_DUTY.load(Ordering::SeqCst), now_ms);
    hw_init::gpio_write(pins::HEATER_SSR_GPIO, level);
}
