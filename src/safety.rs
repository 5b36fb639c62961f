//! Safety supervisor.
//!
//! The supervisor is consulted **on every temperature sample**: inside the
//! regulator's measurement path while heating, and once per refresh in the
//! cooling loop where the regulator is idle.
//!
//! ## Trip lifecycle
//!
//! 1. A sample reaches `critical_temp_c`.
//! 2. The supervisor latches the trip and returns it.
//! 3. The caller stops the regulator, zeroes the heater and requests a
//!    restart, in that order.
//! 4. The latch never clears within a process run; every later check
//!    returns the same trip, reading or not.
//!
//! A missing reading (thermocouple fault) raises no signal on its own.

use log::error;

use crate::error::SafetyTrip;

/// Over-temperature latch.
pub struct SafetySupervisor {
    critical_c: f32,
    tripped: Option<SafetyTrip>,
}

impl SafetySupervisor {
    pub fn new(critical_c: f32) -> Self {
        Self {
            critical_c,
            tripped: None,
        }
    }

    /// Evaluate one sample.  Returns the trip when the plate is (or once
    /// was) at or above the critical temperature.
    pub fn check(&mut self, measured_c: Option<f32>) -> Option<SafetyTrip> {
        if let Some(trip) = self.tripped {
            return Some(trip);
        }
        let measured_c = measured_c?;
        if measured_c >= self.critical_c {
            let trip = SafetyTrip {
                measured_c,
                limit_c: self.critical_c,
            };
            error!("SAFETY TRIP: {trip}");
            self.tripped = Some(trip);
            return Some(trip);
        }
        None
    }

    /// True once a trip has been latched.
    pub fn is_tripped(&self) -> bool {
        self.tripped.is_some()
    }

    /// The latched trip, if any.
    pub fn trip(&self) -> Option<SafetyTrip> {
        self.tripped
    }

    pub fn critical_c(&self) -> f32 {
        self.critical_c
    }
}
