//! Profile follower: phases to a time-varying setpoint.
//!
//! ```text
//!   temp
//!    ▲        phase 2         phase 3 (hold)
//!    │          ┌──────────────────────
//!    │        ┌─┘
//!    │      ┌─┘   substeps every `substep_secs`
//!    │    ┌─┘
//!    │  ┌─┘
//!    └──┴──────────────────────────────▶ t
//! ```
//!
//! Each phase ramps linearly from where the previous phase ended to its
//! target, in truncated substeps.  A phase whose target equals the previous
//! one is a hold: the regulator gets the target once and no substeps.
//! After the last phase the setpoint drops to [`HOLD_SETPOINT_C`] so the
//! regulator keeps sampling (and logging) without heating.

use crate::error::Result;
use crate::profile::Phase;

/// Setpoint left on the regulator after a completed profile.
pub const HOLD_SETPOINT_C: f32 = 1.0;

/// What the follower drives.  Implemented by the controller context.
pub trait SetpointDriver {
    fn now_ms(&self) -> u64;

    /// Fresh plate temperature, `None` if the sensor has no reading.
    fn temperature(&mut self) -> Result<Option<f32>>;

    fn apply_setpoint(&mut self, setpoint_c: f32) -> Result<()>;

    /// Stop the regulator and de-energize the heater.
    fn stop_regulation(&mut self) -> Result<()>;

    /// Liveness: `false` cancels the run at the next poll tick.
    fn keep_running(&mut self) -> Result<bool>;

    /// Cooperative wait; the regulator keeps being serviced.
    fn pause(&mut self, ms: u32) -> Result<()>;
}

/// Follower progress notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    PhaseStarted {
        index: usize,
        target_c: f32,
        duration_secs: u32,
    },
    Substep {
        elapsed_secs: u32,
        setpoint_c: f32,
    },
    PhaseFinished {
        index: usize,
        elapsed_secs: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Completed,
    /// Liveness went false; the regulator has been stopped.
    Cancelled,
}

/// Stateless profile interpolator; one [`run`](Self::run) per flow.
pub struct ProfileFollower {
    substep_secs: u32,
    poll_ms: u32,
    ambient_c: f32,
}

impl ProfileFollower {
    pub fn new(substep_secs: u32, poll_ms: u32, ambient_c: f32) -> Self {
        Self {
            substep_secs: substep_secs.max(1),
            poll_ms: poll_ms.max(1),
            ambient_c,
        }
    }

    /// Follow `phases` without progress reporting.
    pub fn run<D: SetpointDriver>(&self, phases: &[Phase], driver: &mut D) -> Result<FollowOutcome> {
        self.run_with_progress(phases, driver, |_, _| Ok(()))
    }

    /// Follow `phases`, reporting each [`Progress`] to `progress`.
    pub fn run_with_progress<D, P>(
        &self,
        phases: &[Phase],
        driver: &mut D,
        mut progress: P,
    ) -> Result<FollowOutcome>
    where
        D: SetpointDriver,
        P: FnMut(&mut D, &Progress) -> Result<()>,
    {
        if phases.is_empty() {
            return Ok(FollowOutcome::Completed);
        }

        let substep_ms = u64::from(self.substep_secs) * 1000;
        let mut current_c = driver.temperature()?.unwrap_or(self.ambient_c);
        let mut previous_target: Option<f32> = None;

        for (index, phase) in phases.iter().enumerate() {
            let target_c = phase.target_c;
            let hold = previous_target.is_some_and(|prev| same_temp(prev, target_c));
            progress(
                driver,
                &Progress::PhaseStarted {
                    index,
                    target_c,
                    duration_secs: phase.duration_secs,
                },
            )?;

            if phase.duration_secs == 0 {
                current_c = target_c;
                previous_target = Some(target_c);
                progress(
                    driver,
                    &Progress::PhaseFinished {
                        index,
                        elapsed_secs: 0,
                    },
                )?;
                continue;
            }

            let step_c = (target_c - current_c) / phase.duration_secs as f32 * self.substep_secs as f32;
            let mut sub_target = step_toward(current_c, step_c, target_c);
            let phase_start = driver.now_ms();
            let mut deadline = phase_start + substep_ms;
            let duration_ms = u64::from(phase.duration_secs) * 1000;

            driver.apply_setpoint(if hold { target_c } else { sub_target.trunc() })?;

            loop {
                if !driver.keep_running()? {
                    driver.stop_regulation()?;
                    return Ok(FollowOutcome::Cancelled);
                }

                let now = driver.now_ms();
                let elapsed_ms = now.saturating_sub(phase_start);

                if now > deadline {
                    sub_target = step_toward(sub_target, step_c, target_c);
                    deadline += substep_ms;
                    let setpoint_c = if hold { target_c } else { sub_target.trunc() };
                    progress(
                        driver,
                        &Progress::Substep {
                            elapsed_secs: (elapsed_ms / 1000) as u32,
                            setpoint_c,
                        },
                    )?;
                    if !hold {
                        driver.apply_setpoint(setpoint_c)?;
                    }
                }

                if elapsed_ms >= duration_ms {
                    current_c = target_c;
                    progress(
                        driver,
                        &Progress::PhaseFinished {
                            index,
                            elapsed_secs: (elapsed_ms / 1000) as u32,
                        },
                    )?;
                    break;
                }

                driver.pause(self.poll_ms)?;
            }
            previous_target = Some(target_c);
        }

        driver.apply_setpoint(HOLD_SETPOINT_C)?;
        Ok(FollowOutcome::Completed)
    }
}

/// Advance `from` by `step`, never past `target`.
fn step_toward(from: f32, step: f32, target: f32) -> f32 {
    let next = from + step;
    if step >= 0.0 { next.min(target) } else { next.max(target) }
}

fn same_temp(a: f32, b: f32) -> bool {
    (a - b).abs() < f32::EPSILON
}
