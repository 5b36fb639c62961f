//! Periodic regulator.
//!
//! ```text
//!   Controller::pause ──▶ Regulator::service(now, io)
//!                              │  due?
//!                              ├─▶ io.measure()  ── safety check, sample log
//!                              └─▶ io.apply(duty) ── heater slow-PWM
//! ```
//!
//! The regulator owns *when* to sample and *what* output to compute.  It
//! never touches hardware: the measure/apply pair is handed in on every
//! [`Regulator::service`] call as a [`ControlIo`], so the caller keeps sole
//! ownership of the buses between samples.

use log::info;

use super::pid::PidController;
use crate::config::PidGains;
use crate::error::Result;

/// Measurement source and output sink for one regulator sample.
pub trait ControlIo {
    /// Current plate temperature, `None` when the sensor has no reading.
    ///
    /// An `Err` aborts the sample; the regulator stops itself before
    /// propagating it.
    fn measure(&mut self) -> Result<Option<f32>>;

    /// Drive the heater (duty in percent, 0–100).
    fn apply(&mut self, duty: u8) -> Result<()>;
}

/// Callback-driven setpoint regulator.
pub trait Regulator {
    /// Begin sampling toward `setpoint`; the first sample is due at once.
    fn start(&mut self, setpoint: f32, now_ms: u64);

    /// Change the setpoint.  Arms sampling if the regulator was stopped.
    fn set_setpoint(&mut self, value: f32, now_ms: u64);

    /// Halt sampling.  The caller is responsible for zeroing the heater.
    fn stop(&mut self);

    /// Active setpoint, `None` while stopped.
    fn setpoint(&self) -> Option<f32>;

    /// Absolute time of the next sample, `None` while stopped.
    fn next_sample_at(&self) -> Option<u64>;

    /// Take a sample if one is due.
    fn service(&mut self, now_ms: u64, io: &mut dyn ControlIo) -> Result<()>;

    fn is_running(&self) -> bool {
        self.next_sample_at().is_some()
    }
}

/// [`PidController`] behind a fixed sample period.
pub struct PidRegulator {
    pid: PidController,
    period_ms: u32,
    next_due_ms: Option<u64>,
    output: u8,
}

impl PidRegulator {
    /// Build a stopped regulator.  Output is clamped to `output_min..=output_max`
    /// percent.
    pub fn new(gains: PidGains, period_ms: u32, output_min: f32, output_max: f32) -> Self {
        Self {
            pid: PidController::new(gains, output_min, output_max),
            period_ms: period_ms.max(1),
            next_due_ms: None,
            output: 0,
        }
    }

    /// Last duty applied.
    pub fn output(&self) -> u8 {
        self.output
    }
}

impl Regulator for PidRegulator {
    fn start(&mut self, setpoint: f32, now_ms: u64) {
        self.pid.reset();
        self.pid.set_target(setpoint);
        self.next_due_ms = Some(now_ms);
        info!("Regulator started at {setpoint:.0} C");
    }

    fn set_setpoint(&mut self, value: f32, now_ms: u64) {
        if self.next_due_ms.is_none() {
            self.start(value, now_ms);
        } else {
            self.pid.set_target(value);
        }
    }

    fn stop(&mut self) {
        if self.next_due_ms.take().is_some() {
            info!("Regulator stopped");
        }
        self.pid.reset();
        self.output = 0;
    }

    fn setpoint(&self) -> Option<f32> {
        self.next_due_ms.map(|_| self.pid.target())
    }

    fn next_sample_at(&self) -> Option<u64> {
        self.next_due_ms
    }

    fn service(&mut self, now_ms: u64, io: &mut dyn ControlIo) -> Result<()> {
        let Some(due) = self.next_due_ms else {
            return Ok(());
        };
        if now_ms < due {
            return Ok(());
        }

        let period = u64::from(self.period_ms);
        // Never queue a burst of catch-up samples after a long pause.
        let next = due + period;
        self.next_due_ms = Some(if next > now_ms { next } else { now_ms + period });

        let measured = match io.measure() {
            Ok(m) => m,
            Err(e) => {
                self.stop();
                return Err(e);
            }
        };

        // No reading: hold the previous output.
        if let Some(temp) = measured {
            let dt = self.period_ms as f32 / 1000.0;
            self.output = self.pid.compute(temp, dt) as u8;
            io.apply(self.output)?;
        }
        Ok(())
    }
}
