//! System configuration parameters
//!
//! All tunable parameters for the Plancha hot plate.  Supplied once at
//! process start; the binary may embed a JSON override at build time.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::{self, MAX_PROFILES, Profile};

/// PID gains for the plate regulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// Range and step of the pre-heat temperature picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerRange {
    pub initial: i32,
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateConfig {
    // --- Safety ---
    /// Heating MUST stop and the board restarts at or above this (°C)
    pub critical_temp_c: f32,

    // --- Cooling ---
    /// Automatic cooling stops under this temperature (°C)
    pub cooling_min_temp_c: f32,
    /// First cooling stage after a completed reflow stops under this (°C)
    pub reflow_cooling_stop_c: f32,

    // --- Profile following ---
    /// Interval between intermediate setpoint updates (seconds)
    pub substep_interval_secs: u32,
    /// Ramp origin used when the thermocouple has no reading at flow start (°C)
    pub ambient_fallback_c: f32,
    /// Reflow profiles offered in the menu
    pub profiles: Vec<Profile, MAX_PROFILES>,

    // --- Regulator ---
    pub pid: PidGains,
    /// PID sample period (milliseconds)
    pub pid_sample_period_ms: u32,
    /// Heater slow-PWM period (milliseconds)
    pub heater_pwm_period_ms: u32,

    // --- UI ---
    /// Pre-heat temperature picker
    pub preheat: PickerRange,
    /// Menu / profile poll interval (milliseconds)
    pub poll_interval_ms: u32,
    /// Button poll interval while waiting on a display refresh (milliseconds)
    pub button_poll_ms: u32,
    /// Temperature display refresh in pre-heat and cooling (milliseconds)
    pub display_refresh_ms: u32,
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            // Safety
            critical_temp_c: 380.0,

            // Cooling
            cooling_min_temp_c: 35.0,
            reflow_cooling_stop_c: 100.0,

            // Profile following
            substep_interval_secs: 5,
            ambient_fallback_c: 25.0,
            profiles: profile::builtin_profiles(),

            // Regulator (tuned on the 400 W plate)
            pid: PidGains {
                kp: 1.95,
                ki: 0.0125,
                kd: 4.5,
            },
            pid_sample_period_ms: 1000,
            heater_pwm_period_ms: 1500,

            // UI
            preheat: PickerRange {
                initial: 100,
                min: 50,
                max: 250,
                step: 5,
            },
            poll_interval_ms: 100,
            button_poll_ms: 50,
            display_refresh_ms: 500,
        }
    }
}

impl PlateConfig {
    /// Parse a JSON document into a validated configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.
    ///
    /// Invalid values are rejected, not clamped: a bad override must never
    /// raise the safety ceiling or produce a profile that runs into it.
    pub fn validate(&self) -> Result<()> {
        if !self.critical_temp_c.is_finite() || self.critical_temp_c <= 0.0 {
            return Err(Error::Config("critical_temp_c must be positive"));
        }
        if self.cooling_min_temp_c >= self.critical_temp_c {
            return Err(Error::Config("cooling_min_temp_c must be below critical_temp_c"));
        }
        if self.reflow_cooling_stop_c >= self.critical_temp_c {
            return Err(Error::Config("reflow_cooling_stop_c must be below critical_temp_c"));
        }
        if self.substep_interval_secs == 0 {
            return Err(Error::Config("substep_interval_secs must be > 0"));
        }
        if self.pid_sample_period_ms == 0 {
            return Err(Error::Config("pid_sample_period_ms must be > 0"));
        }
        if self.heater_pwm_period_ms < 100 {
            return Err(Error::Config("heater_pwm_period_ms must be >= 100"));
        }
        if self.poll_interval_ms == 0 || self.poll_interval_ms > 100 {
            return Err(Error::Config("poll_interval_ms must be in 1..=100"));
        }
        if self.button_poll_ms == 0 || self.display_refresh_ms == 0 {
            return Err(Error::Config("UI intervals must be > 0"));
        }
        let r = &self.preheat;
        if r.step <= 0 || r.min > r.max || r.initial < r.min || r.initial > r.max {
            return Err(Error::Config("preheat picker range is inconsistent"));
        }
        if r.max as f32 >= self.critical_temp_c {
            return Err(Error::Config("preheat maximum must be below critical_temp_c"));
        }
        if self.profiles.is_empty() {
            return Err(Error::Config("at least one profile is required"));
        }
        for p in &self.profiles {
            p.validate(self.critical_temp_c)?;
        }
        Ok(())
    }
}
