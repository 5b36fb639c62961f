//! PID law for the plate heater.
//!
//! Positional PID with output clamping and conditional-integration
//! anti-windup.  Output is heater duty in percent.  Timing (when to
//! sample) is the [`Regulator`](super::regulator::Regulator)'s business;
//! this type is pure arithmetic.

use crate::config::PidGains;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_error: Option<f32>,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(gains: PidGains, output_min: f32, output_max: f32) -> Self {
        Self {
            kp: gains.kp,
            ki: gains.ki,
            kd: gains.kd,
            setpoint: 0.0,
            integral: 0.0,
            prev_error: None,
            output_min,
            output_max,
        }
    }

    /// Update setpoint (°C).  Accumulated state is kept so a ramp does not
    /// kick the derivative term on every substep.
    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    /// Compute output for one sample.  `dt` in seconds.
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;

        let p = self.kp * error;

        self.integral += error * dt;
        let i = self.ki * self.integral;

        // No derivative on the first sample after a reset.
        let d = match self.prev_error {
            Some(prev) if dt > 0.0 => self.kd * (error - prev) / dt,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let output = (p + i + d).clamp(self.output_min, self.output_max);

        // Saturated: undo this sample's integration.
        if output >= self.output_max || output <= self.output_min {
            self.integral -= error * dt;
        }

        output
    }

    /// Forget integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}
