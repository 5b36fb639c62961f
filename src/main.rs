//! Plancha Firmware — Main Entry Point
//!
//! Hexagonal architecture on a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter                    LogEventSink   Esp32Clock  │
//! │  (Sensor+Actuator+Display+Input)    (EventSink)    (Clock)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │             AppController (pure logic)                 │    │
//! │  │  Menus · ProfileFollower · Safety · PID regulator      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Heater slow-PWM on esp_timer (independent of the main loop)   │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use core::cell::RefCell;

use anyhow::Result;
use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use log::{info, warn};

use plancha::adapters::hardware::HardwareAdapter;
use plancha::adapters::log_sink::LogEventSink;
use plancha::adapters::time::Esp32Clock;
use plancha::app::service::{temperature_line, AppController, RunOutcome};
use plancha::config::PlateConfig;
use plancha::control::regulator::PidRegulator;
use plancha::drivers::encoder::{self, TwistEncoder};
use plancha::drivers::heater::HeaterDriver;
use plancha::drivers::hw_init;
use plancha::drivers::lcd::{self, Lcd1602};
use plancha::drivers::max31855::Max31855;
use plancha::drivers::switches::{CoolingRelay, RunSwitch};
use plancha::pins;

/// Configuration: an optional JSON document embedded at build time, else
/// the compiled-in defaults.
fn load_config() -> PlateConfig {
    match option_env!("PLANCHA_CONFIG") {
        Some(json) => match PlateConfig::from_json(json) {
            Ok(cfg) => {
                info!("Config loaded from PLANCHA_CONFIG");
                cfg
            }
            Err(e) => {
                warn!("PLANCHA_CONFIG rejected ({}), using defaults", e);
                PlateConfig::default()
            }
        },
        None => PlateConfig::default(),
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Plancha v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Heater and relay pins LOW before anything else ─────
    hw_init::init_gpio()?;
    let config = load_config();
    let heater = HeaterDriver::start(config.heater_pwm_period_ms)?;

    // ── 3. Buses ──────────────────────────────────────────────
    // Pin numbers must match `pins.rs`.
    let p = Peripherals::take()?;

    let spi = SpiDriver::new(
        p.spi2,
        p.pins.gpio12, // SCK
        p.pins.gpio11, // MOSI (unused by the MAX31855)
        Some(p.pins.gpio13), // MISO
        &SpiDriverConfig::new(),
    )?;
    let thermocouple_spi = SpiDeviceDriver::new(
        spi,
        Some(p.pins.gpio10),
        &SpiConfig::new().baudrate(pins::THERMOCOUPLE_SPI_HZ.Hz()),
    )?;

    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio8, // SDA
        p.pins.gpio9, // SCL
        &I2cConfig::new().baudrate(pins::I2C_HZ.Hz()),
    )?;
    let i2c_bus = RefCell::new(i2c);

    // ── 4. Drivers ────────────────────────────────────────────
    let mut thermocouple = Max31855::new(thermocouple_spi);
    let mut lcd = Lcd1602::new(RefCellDevice::new(&i2c_bus), Ets, lcd::DEFAULT_ADDRESS);
    lcd.init()?;
    lcd.print("Plancha CMS", 2, 0)?;
    lcd.print(&temperature_line(thermocouple.read().ok()), 0, 1)?;

    let encoder = TwistEncoder::new(RefCellDevice::new(&i2c_bus), encoder::DEFAULT_ADDRESS);

    let hw = HardwareAdapter::new(thermocouple, lcd, encoder, heater, CoolingRelay::new());
    let regulator = PidRegulator::new(config.pid, config.pid_sample_period_ms, 0.0, 100.0);

    // ── 5. Run ────────────────────────────────────────────────
    let mut app = AppController::new(hw, Esp32Clock::new(), regulator, LogEventSink::new(), config);
    match app.run() {
        RunOutcome::Restart(reason) => {
            warn!("Restarting: {}", reason);
            FreeRtos::delay_ms(100);
            esp_idf_hal::reset::restart();
        }
        RunOutcome::Disabled => {
            info!("Run switch released; waiting for it to be set again");
            drop(app);
            while !RunSwitch.is_enabled() {
                FreeRtos::delay_ms(200);
            }
            esp_idf_hal::reset::restart();
        }
    }
}
