//! I²C RGB rotary encoder (SparkFun Qwiic Twist register map).
//!
//! | Reg  | Name   | Notes                                         |
//! |------|--------|-----------------------------------------------|
//! | 0x01 | STATUS | bit0 moved, bit1 pressed, bit2 clicked        |
//! | 0x05 | COUNT  | i16, little endian, running count             |
//! | 0x0D | RED    | knob LED, followed by GREEN and BLUE          |
//!
//! The pressed bit is latched by the encoder firmware and
//! [`TwistEncoder::button_pressed`] clears it after reading, so a single
//! press reads `true` once however long the knob is held.

use embedded_hal::i2c::I2c;

pub const DEFAULT_ADDRESS: u8 = 0x3F;

const REG_STATUS: u8 = 0x01;
const REG_COUNT: u8 = 0x05;
const REG_RED: u8 = 0x0D;

const STATUS_PRESSED: u8 = 1 << 1;

pub struct TwistEncoder<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> TwistEncoder<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Running encoder count.
    pub fn count(&mut self) -> Result<i16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c.write_read(self.address, &[REG_COUNT], &mut buf)?;
        Ok(i16::from_le_bytes(buf))
    }

    /// Whether the knob was pressed since the last read.
    pub fn button_pressed(&mut self) -> Result<bool, I2C::Error> {
        let mut status = [0u8; 1];
        self.i2c.write_read(self.address, &[REG_STATUS], &mut status)?;
        let pressed = status[0] & STATUS_PRESSED != 0;
        if pressed {
            self.i2c
                .write(self.address, &[REG_STATUS, status[0] & !STATUS_PRESSED])?;
        }
        Ok(pressed)
    }

    /// Knob LED colour.
    pub fn set_color(&mut self, r: u8, g: u8, b: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[REG_RED, r, g, b])
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}
