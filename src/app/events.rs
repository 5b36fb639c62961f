//! Outbound application events.
//!
//! The [`AppController`](super::service::AppController) and the
//! [`Controller`](super::context::Controller) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use super::state::AppState;
use crate::error::{Error, SafetyTrip, SensorError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application has started (carries initial state).
    Started(AppState),

    /// The controller transitioned between states.
    StateChanged { from: AppState, to: AppState },

    /// A new regulator setpoint was applied (°C).
    SetpointChanged(f32),

    /// One regulator sample while a setpoint is active.
    Sample(Sample),

    /// A profile phase began.
    PhaseStarted { index: usize, target_c: f32, duration_secs: u32 },

    /// The thermocouple returned no reading this cycle.
    SensorFault(SensorError),

    /// The plate reached the critical temperature.
    SafetyTrip(SafetyTrip),

    /// The application cannot continue; the device must be restarted.
    RestartRequested(RestartReason),
}

/// A regulator sample suitable for logging: seconds since the setpoint was
/// last changed, the setpoint, and the measured temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub elapsed_secs: u32,
    pub setpoint_c: f32,
    pub temperature_c: f32,
}

/// Why the application gave up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestartReason {
    SafetyTrip(SafetyTrip),
    Unhandled(Error),
}

impl core::fmt::Display for RestartReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SafetyTrip(trip) => write!(f, "{trip}"),
            Self::Unhandled(e) => write!(f, "unhandled error: {e}"),
        }
    }
}

impl From<Error> for RestartReason {
    fn from(e: Error) -> Self {
        match e {
            Error::Safety(trip) => Self::SafetyTrip(trip),
            other => Self::Unhandled(other),
        }
    }
}
