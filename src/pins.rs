//! GPIO / peripheral pin assignments for the Plancha controller board
//! (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Heater & cooling
// ---------------------------------------------------------------------------

/// Solid-state relay input for the plate heater (active HIGH).
pub const HEATER_SSR_GPIO: i32 = 5;
/// Cooling fan relay (active HIGH).
pub const COOLING_RELAY_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Run-enable switch (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// LOW = application allowed to run.
pub const RUN_SWITCH_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// SPI bus — MAX31855 thermocouple (read only)
// ---------------------------------------------------------------------------

pub const SPI_SCK_GPIO: i32 = 12;
pub const SPI_MISO_GPIO: i32 = 13;
pub const SPI_MOSI_GPIO: i32 = 11;
pub const THERMOCOUPLE_CS_GPIO: i32 = 10;
/// MAX31855 tolerates up to 5 MHz.
pub const THERMOCOUPLE_SPI_HZ: u32 = 5_000_000;

// ---------------------------------------------------------------------------
// I²C bus — LCD backpack + RGB encoder
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_HZ: u32 = 100_000;
