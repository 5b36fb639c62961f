//! Unified error types for the Plancha firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! top-level fail-safe net in [`AppController::run`](crate::app::service::AppController::run)
//! handles every failure the same way.  All variants are `Copy` so they can
//! travel through the regulator sample path and the flows without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// The thermocouple could not produce a reading.
    Sensor(SensorError),
    /// The LCD did not accept a command.
    Display(BusError),
    /// The encoder or the run-enable switch could not be read or written.
    Input(BusError),
    /// A heater or relay command failed.
    Actuator(BusError),
    /// The plate reached the critical temperature.
    Safety(SafetyTrip),
    /// Configuration or profile data is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Display(e) => write!(f, "display: {e}"),
            Self::Input(e) => write!(f, "input: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Safety(trip) => write!(f, "safety: {trip}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Reasons the thermocouple returned no usable reading.
///
/// These are never fatal on their own: the control loop skips the cycle and
/// re-reads on the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Thermocouple is not connected.
    OpenCircuit,
    /// Thermocouple shorted to ground.
    ShortToGround,
    /// Thermocouple shorted to VCC.
    ShortToVcc,
    /// The SPI transfer itself failed.
    Bus,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCircuit => write!(f, "thermocouple open"),
            Self::ShortToGround => write!(f, "thermocouple short to GND"),
            Self::ShortToVcc => write!(f, "thermocouple short to VCC"),
            Self::Bus => write!(f, "SPI transfer failed"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// I2C transaction NACKed or timed out.
    I2c,
    /// SPI transaction failed.
    Spi,
    /// GPIO read or write failed.
    Gpio,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c => write!(f, "I2C transaction failed"),
            Self::Spi => write!(f, "SPI transaction failed"),
            Self::Gpio => write!(f, "GPIO access failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Safety trip
// ---------------------------------------------------------------------------

/// The plate measured at or above the critical temperature.
///
/// Terminal for the running process: the only recovery is a device restart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetyTrip {
    pub measured_c: f32,
    pub limit_c: f32,
}

impl fmt::Display for SafetyTrip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "critical temperature reached ({:.1}\u{00b0}C >= {:.1}\u{00b0}C)",
            self.measured_c, self.limit_c
        )
    }
}

impl From<SafetyTrip> for Error {
    fn from(trip: SafetyTrip) -> Self {
        Self::Safety(trip)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
