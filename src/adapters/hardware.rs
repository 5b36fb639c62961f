//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns every driver and exposes them through [`SensorPort`],
//! [`ActuatorPort`], [`DisplayPort`] and [`InputPort`].  This is the only
//! module in the system that touches actual hardware.  Bus errors are
//! folded into the firmware [`Error`] here so the domain never sees a
//! HAL error type.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;

use crate::app::ports::{ActuatorPort, DisplayPort, InputPort, Position, Rgb, SensorPort};
use crate::drivers::encoder::TwistEncoder;
use crate::drivers::heater::HeaterDriver;
use crate::drivers::lcd::Lcd1602;
use crate::drivers::max31855::Max31855;
use crate::drivers::switches::{CoolingRelay, RunSwitch};
use crate::error::{BusError, Error, Result, SensorError};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<SPI, LI2C, EI2C, D> {
    thermocouple: Max31855<SPI>,
    lcd: Lcd1602<LI2C, D>,
    encoder: TwistEncoder<EI2C>,
    heater: HeaterDriver,
    relay: CoolingRelay,
    run: RunSwitch,
}

impl<SPI, LI2C, EI2C, D> HardwareAdapter<SPI, LI2C, EI2C, D>
where
    SPI: SpiDevice,
    LI2C: I2c,
    EI2C: I2c,
    D: DelayNs,
{
    pub fn new(
        thermocouple: Max31855<SPI>,
        lcd: Lcd1602<LI2C, D>,
        encoder: TwistEncoder<EI2C>,
        heater: HeaterDriver,
        relay: CoolingRelay,
    ) -> Self {
        Self {
            thermocouple,
            lcd,
            encoder,
            heater,
            relay,
            run: RunSwitch,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<SPI, LI2C, EI2C, D> SensorPort for HardwareAdapter<SPI, LI2C, EI2C, D>
where
    SPI: SpiDevice,
    LI2C: I2c,
    EI2C: I2c,
    D: DelayNs,
{
    fn read_temperature(&mut self) -> core::result::Result<f32, SensorError> {
        self.thermocouple.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<SPI, LI2C, EI2C, D> ActuatorPort for HardwareAdapter<SPI, LI2C, EI2C, D>
where
    SPI: SpiDevice,
    LI2C: I2c,
    EI2C: I2c,
    D: DelayNs,
{
    fn set_heater_duty(&mut self, duty: u8) -> Result<()> {
        self.heater.set_duty(duty);
        Ok(())
    }

    fn set_cooling_relay(&mut self, on: bool) -> Result<()> {
        self.relay.set(on);
        Ok(())
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<SPI, LI2C, EI2C, D> DisplayPort for HardwareAdapter<SPI, LI2C, EI2C, D>
where
    SPI: SpiDevice,
    LI2C: I2c,
    EI2C: I2c,
    D: DelayNs,
{
    fn clear(&mut self) -> Result<()> {
        self.lcd.clear().map_err(|_| Error::Display(BusError::I2c))
    }

    fn print(&mut self, text: &str, at: Position) -> Result<()> {
        self.lcd
            .print(text, at.col, at.row)
            .map_err(|_| Error::Display(BusError::I2c))
    }
}

// ── InputPort implementation ──────────────────────────────────

impl<SPI, LI2C, EI2C, D> InputPort for HardwareAdapter<SPI, LI2C, EI2C, D>
where
    SPI: SpiDevice,
    LI2C: I2c,
    EI2C: I2c,
    D: DelayNs,
{
    fn position(&mut self) -> Result<i32> {
        self.encoder
            .count()
            .map(i32::from)
            .map_err(|_| Error::Input(BusError::I2c))
    }

    fn button_pressed(&mut self) -> Result<bool> {
        self.encoder
            .button_pressed()
            .map_err(|_| Error::Input(BusError::I2c))
    }

    fn run_enabled(&mut self) -> Result<bool> {
        Ok(self.run.is_enabled())
    }

    fn set_indicator(&mut self, color: Rgb) -> Result<()> {
        let Rgb(r, g, b) = color;
        self.encoder
            .set_color(r, g, b)
            .map_err(|_| Error::Input(BusError::I2c))
    }
}
