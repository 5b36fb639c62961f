//! Peripheral drivers and raw hardware helpers.

pub mod encoder;
pub mod heater;
pub mod hw_init;
pub mod lcd;
pub mod max31855;
pub mod switches;
