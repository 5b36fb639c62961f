//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Regulator samples
//! are rendered as the bare `elapsed, setpoint, temp` CSV line so a serial
//! capture can be plotted directly.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Sample(s) => {
                info!(
                    "{}, {}, {}",
                    s.elapsed_secs, s.setpoint_c as i32, s.temperature_c as i32
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::SetpointChanged(sp) => {
                info!("SETPOINT | {:.0}\u{00b0}C", sp);
            }
            AppEvent::PhaseStarted {
                index,
                target_c,
                duration_secs,
            } => {
                info!("PHASE | #{} -> {:.0}\u{00b0}C in {}s", index, target_c, duration_secs);
            }
            AppEvent::SensorFault(e) => {
                warn!("SENSOR | {}", e);
            }
            AppEvent::SafetyTrip(trip) => {
                error!("SAFETY | {}", trip);
            }
            AppEvent::RestartRequested(reason) => {
                error!("RESTART | {}", reason);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
        }
    }
}
