//! Cooling fan relay and run-enable switch.

use log::info;

use super::hw_init;
use crate::pins;

/// Cooling fan relay (active HIGH).
pub struct CoolingRelay {
    on: bool,
}

impl CoolingRelay {
    /// Relay starts released.
    pub fn new() -> Self {
        hw_init::gpio_write(pins::COOLING_RELAY_GPIO, false);
        Self { on: false }
    }

    pub fn set(&mut self, on: bool) {
        if on != self.on {
            info!("relay: cooling {}", if on { "ON" } else { "OFF" });
        }
        hw_init::gpio_write(pins::COOLING_RELAY_GPIO, on);
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Default for CoolingRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Run-enable switch (active LOW, pulled up).
pub struct RunSwitch;

impl RunSwitch {
    pub fn is_enabled(&self) -> bool {
        !hw_init::gpio_read(pins::RUN_SWITCH_GPIO)
    }
}
