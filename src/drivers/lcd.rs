//! 16x2 HD44780 character LCD behind a PCF8574 I²C backpack.
//!
//! The expander drives the LCD in 4-bit mode:
//!
//! ```text
//!   PCF8574:  P7 P6 P5 P4 │ P3 │ P2 │ P1 │ P0
//!   HD44780:  D7 D6 D5 D4 │ BL │ EN │ RW │ RS
//! ```
//!
//! Every byte goes out as two nibbles, each latched by an EN pulse.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Default backpack address (A0..A2 high).
pub const DEFAULT_ADDRESS: u8 = 0x27;
pub const COLS: u8 = 16;
pub const ROWS: u8 = 2;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off, blink off
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit, 2 lines, 5x8
const CMD_SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40];

pub struct Lcd1602<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> Lcd1602<I2C, D> {
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Power-on initialisation into 4-bit mode, then clear.
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        self.delay.delay_ms(50);
        // Three 8-bit function sets, then switch to 4-bit.
        for wait_us in [4_500, 150, 150] {
            self.write_nibble(0x30, 0)?;
            self.delay.delay_us(wait_us);
        }
        self.write_nibble(0x20, 0)?;
        self.command(CMD_FUNCTION_SET)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_ENTRY_MODE)?;
        self.clear()
    }

    pub fn clear(&mut self) -> Result<(), I2C::Error> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Write `text` at (`col`, `row`).  Characters past the last column are
    /// dropped; non-ASCII characters print as `?`.
    pub fn print(&mut self, text: &str, col: u8, row: u8) -> Result<(), I2C::Error> {
        if col >= COLS || row >= ROWS {
            return Ok(());
        }
        self.command(CMD_SET_DDRAM | (ROW_OFFSETS[row as usize] + col))?;
        for c in text.chars().take(usize::from(COLS - col)) {
            let byte = if c.is_ascii() { c as u8 } else { b'?' };
            self.write_byte(byte, RS)?;
        }
        Ok(())
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, cmd: u8) -> Result<(), I2C::Error> {
        self.write_byte(cmd, 0)
    }

    fn write_byte(&mut self, byte: u8, mode: u8) -> Result<(), I2C::Error> {
        self.write_nibble(byte & 0xF0, mode)?;
        self.write_nibble((byte << 4) & 0xF0, mode)
    }

    fn write_nibble(&mut self, nibble: u8, mode: u8) -> Result<(), I2C::Error> {
        let data = nibble | mode | BACKLIGHT;
        self.i2c.write(self.address, &[data | EN])?;
        self.delay.delay_us(1);
        self.i2c.write(self.address, &[data & !EN])?;
        self.delay.delay_us(50);
        Ok(())
    }
}
