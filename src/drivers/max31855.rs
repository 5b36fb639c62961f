//! MAX31855 thermocouple-to-digital converter.
//!
//! One 32-bit read-only SPI frame per conversion:
//!
//! ```text
//!  31        18  17  16  15        4  3   2    1    0
//! ┌────────────┬───┬───┬────────────┬───┬────┬────┬────┐
//! │ TC  (14b)  │ - │ F │ CJ  (12b)  │ - │ SCV│ SCG│ OC │
//! └────────────┴───┴───┴────────────┴───┴────┴────┴────┘
//! ```
//!
//! TC is a signed 14-bit value in 0.25 °C steps; F flags any fault and the
//! low three bits say which one.

use embedded_hal::spi::SpiDevice;

use crate::error::SensorError;

const FAULT_BIT: u32 = 1 << 16;
const OPEN_CIRCUIT: u32 = 1 << 0;
const SHORT_GND: u32 = 1 << 1;
const SHORT_VCC: u32 = 1 << 2;

/// Decode one raw frame into a thermocouple temperature (°C).
pub fn decode(frame: u32) -> Result<f32, SensorError> {
    if frame & FAULT_BIT != 0 {
        return Err(if frame & OPEN_CIRCUIT != 0 {
            SensorError::OpenCircuit
        } else if frame & SHORT_GND != 0 {
            SensorError::ShortToGround
        } else if frame & SHORT_VCC != 0 {
            SensorError::ShortToVcc
        } else {
            SensorError::Bus
        });
    }
    // Arithmetic shift sign-extends the 14-bit field.
    let raw = (frame as i32) >> 18;
    Ok(raw as f32 * 0.25)
}

pub struct Max31855<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Max31855<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Read the hot-junction temperature.
    pub fn read(&mut self) -> Result<f32, SensorError> {
        let mut buf = [0u8; 4];
        self.spi.read(&mut buf).map_err(|_| SensorError::Bus)?;
        decode(u32::from_be_bytes(buf))
    }
}
