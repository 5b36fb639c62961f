//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller / AppController (domain)
//! ```
//!
//! Driven adapters (thermocouple, heater, LCD, encoder, event sinks)
//! implement these traits.  The [`Controller`](super::context::Controller)
//! consumes them via generics, so the domain core never touches a bus
//! directly.

use crate::error::{Result, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: plate temperature.
pub trait SensorPort {
    /// One thermocouple conversion in °C.
    fn read_temperature(&mut self) -> core::result::Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: heater and cooling.
pub trait ActuatorPort {
    /// Heater duty ratio in percent (0–100).
    fn set_heater_duty(&mut self, duty: u8) -> Result<()>;

    /// Energise or release the cooling fan relay.
    fn set_cooling_relay(&mut self, on: bool) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → LCD)
// ───────────────────────────────────────────────────────────────

/// Character cell on the two-line display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub col: u8,
    pub row: u8,
}

impl Position {
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }
}

pub trait DisplayPort {
    fn clear(&mut self) -> Result<()>;

    /// Write `text` starting at `at`.  Text past the end of the row is dropped.
    fn print(&mut self, text: &str, at: Position) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Input port (driven adapter: encoder + run switch → domain)
// ───────────────────────────────────────────────────────────────

/// Indicator colour on the encoder knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const OFF: Self = Self(0, 0, 0);
    pub const RED: Self = Self(255, 0, 0);
    pub const GREEN: Self = Self(0, 255, 0);
    pub const BLUE: Self = Self(0, 0, 255);
}

pub trait InputPort {
    /// Absolute encoder count.  Callers diff it against their own baseline.
    fn position(&mut self) -> Result<i32>;

    /// `true` if a press is pending or the button is held.
    ///
    /// The encoder latches a press and clears it on read, so a short press
    /// reads `true` exactly once.  Callers act on the first `true` they see
    /// and use a release wait only to ride out a longer hold.
    fn button_pressed(&mut self) -> Result<bool>;

    /// Run-enable switch.  `false` makes the application exit.
    fn run_enabled(&mut self) -> Result<bool>;

    fn set_indicator(&mut self, color: Rgb) -> Result<()>;
}

/// Everything the controller drives, as one owned value.
pub trait PlateHardware: SensorPort + ActuatorPort + DisplayPort + InputPort {}

impl<T: SensorPort + ActuatorPort + DisplayPort + InputPort> PlateHardware for T {}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock plus a blocking sleep.
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Console (menu-facing view)
// ───────────────────────────────────────────────────────────────

/// Display, encoder and a cooperative idle: all the menus need.
///
/// The menus never see actuators or the regulator, but `idle` lets the
/// implementation keep the regulator serviced while they wait.
pub trait Console {
    fn clear(&mut self) -> Result<()>;
    fn print(&mut self, text: &str, at: Position) -> Result<()>;
    fn position(&mut self) -> Result<i32>;
    fn button_pressed(&mut self) -> Result<bool>;
    fn idle(&mut self, ms: u32) -> Result<()>;
}
