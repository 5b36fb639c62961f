//! Simulated hot plate for integration tests.
//!
//! One [`SimPlate`] implements every hardware port: a first-order thermal
//! model behind the thermocouple, a scripted encoder and run switch, and a
//! recording display.  Time comes from a [`SimClock`] shared with the
//! plate, so scripted inputs fire at simulated milliseconds and a whole
//! reflow runs in a blink.

use std::cell::Cell;
use std::rc::Rc;

use plancha::app::events::AppEvent;
use plancha::app::ports::{
    ActuatorPort, Clock, DisplayPort, EventSink, InputPort, Position, Rgb, SensorPort,
};
use plancha::app::service::AppController;
use plancha::app::state::AppState;
use plancha::config::PlateConfig;
use plancha::control::regulator::PidRegulator;
use plancha::error::{BusError, Error, Result, SensorError};

pub const AMBIENT_C: f32 = 25.0;
/// Full-duty heating rate (°C/s).
const HEAT_RATE: f32 = 4.0;
/// Passive loss coefficient (1/s).  Caps the plate at ~290 °C.
const LOSS_K: f32 = 0.015;
/// Loss coefficient with the fan running (1/s).
const FAN_K: f32 = 0.06;
/// Integration step of the thermal model (ms).
const MODEL_STEP_MS: u64 = 100;
/// A scripted test that runs this long has hung.
const SIM_LIMIT_MS: u64 = 2 * 60 * 60 * 1000;
/// How long a scripted press is held.
pub const PRESS_MS: u64 = 100;

// ── SimClock ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&mut self, ms: u32) {
        let next = self.now.get() + u64::from(ms);
        assert!(next < SIM_LIMIT_MS, "simulation ran past its time limit");
        self.now.set(next);
    }
}

// ── SimPlate ──────────────────────────────────────────────────

pub struct SimPlate {
    now: Rc<Cell<u64>>,
    temp_c: f32,
    modelled_to_ms: u64,

    duty: u8,
    relay: bool,
    pub duty_history: Vec<u8>,
    pub relay_history: Vec<(u64, bool)>,
    pub indicator_history: Vec<Rgb>,
    pub prints: Vec<(String, Position)>,
    pub peak_c: f32,

    presses: Vec<u64>,
    latched_button: bool,
    turns: Vec<(u64, i32)>,
    run_off_at: Option<u64>,
    overheat: Option<(u64, f32)>,
    sensor_fault: Option<(u64, u64)>,
    display_fault_from: Option<u64>,
}

#[allow(dead_code)]
impl SimPlate {
    pub fn new(clock: &SimClock) -> Self {
        Self {
            now: Rc::clone(&clock.now),
            temp_c: AMBIENT_C,
            modelled_to_ms: 0,
            duty: 0,
            relay: false,
            duty_history: Vec::new(),
            relay_history: Vec::new(),
            indicator_history: Vec::new(),
            prints: Vec::new(),
            peak_c: AMBIENT_C,
            presses: Vec::new(),
            latched_button: false,
            turns: Vec::new(),
            run_off_at: None,
            overheat: None,
            sensor_fault: None,
            display_fault_from: None,
        }
    }

    // ── Script ────────────────────────────────────────────────

    /// Hold the button for [`PRESS_MS`] starting at `at_ms`.
    pub fn press_at(mut self, at_ms: u64) -> Self {
        self.presses.push(at_ms);
        self
    }

    /// Report presses the way the encoder does: each press reads `true`
    /// once, at the first poll at or after it, and is then cleared.
    pub fn latched_button(mut self) -> Self {
        self.latched_button = true;
        self
    }

    /// Encoder reads `position` from `at_ms` on.
    pub fn turn_to(mut self, at_ms: u64, position: i32) -> Self {
        self.turns.push((at_ms, position));
        self
    }

    /// Release the run-enable switch at `at_ms`.
    pub fn run_off_at(mut self, at_ms: u64) -> Self {
        self.run_off_at = Some(at_ms);
        self
    }

    /// The thermocouple reports `temp_c` from `at_ms` on.
    pub fn overheat_from(mut self, at_ms: u64, temp_c: f32) -> Self {
        self.overheat = Some((at_ms, temp_c));
        self
    }

    /// The thermocouple reads open-circuit within `from_ms..until_ms`.
    pub fn sensor_fault(mut self, from_ms: u64, until_ms: u64) -> Self {
        self.sensor_fault = Some((from_ms, until_ms));
        self
    }

    /// Every display write fails from `at_ms` on.
    pub fn display_fault_from(mut self, at_ms: u64) -> Self {
        self.display_fault_from = Some(at_ms);
        self
    }

    // ── Observations ──────────────────────────────────────────

    pub fn now_ms(&self) -> u64 {
        self.now.get()
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn relay_on(&self) -> bool {
        self.relay
    }

    pub fn max_duty(&self) -> u8 {
        self.duty_history.iter().copied().max().unwrap_or(0)
    }

    pub fn printed(&self, text: &str) -> bool {
        self.prints.iter().any(|(t, _)| t == text)
    }

    pub fn printed_at(&self, text: &str, at: Position) -> bool {
        self.prints.iter().any(|(t, p)| t == text && *p == at)
    }

    // ── Model ─────────────────────────────────────────────────

    fn advance(&mut self) {
        let now = self.now.get();
        while self.modelled_to_ms < now {
            let step = (now - self.modelled_to_ms).min(MODEL_STEP_MS);
            let dt = step as f32 / 1000.0;
            let heat = f32::from(self.duty) / 100.0 * HEAT_RATE;
            let k = if self.relay { FAN_K } else { LOSS_K };
            self.temp_c += (heat - (self.temp_c - AMBIENT_C) * k) * dt;
            self.modelled_to_ms += step;
        }
    }

    fn pressed_now(&self) -> bool {
        let now = self.now.get();
        self.presses
            .iter()
            .any(|&at| now >= at && now < at + PRESS_MS)
    }

    /// Read and clear every press that has happened by now.
    fn take_latched_press(&mut self) -> bool {
        let now = self.now.get();
        let before = self.presses.len();
        self.presses.retain(|&at| at > now);
        self.presses.len() < before
    }

    fn display_ok(&self) -> Result<()> {
        match self.display_fault_from {
            Some(at) if self.now.get() >= at => Err(Error::Display(BusError::I2c)),
            _ => Ok(()),
        }
    }
}

impl SensorPort for SimPlate {
    fn read_temperature(&mut self) -> core::result::Result<f32, SensorError> {
        self.advance();
        let now = self.now.get();
        if let Some((from, until)) = self.sensor_fault {
            if now >= from && now < until {
                return Err(SensorError::OpenCircuit);
            }
        }
        let reading = match self.overheat {
            Some((from, t)) if now >= from => t,
            _ => self.temp_c,
        };
        self.peak_c = self.peak_c.max(reading);
        Ok(reading)
    }
}

impl ActuatorPort for SimPlate {
    fn set_heater_duty(&mut self, duty: u8) -> Result<()> {
        self.advance();
        self.duty = duty;
        self.duty_history.push(duty);
        Ok(())
    }

    fn set_cooling_relay(&mut self, on: bool) -> Result<()> {
        self.advance();
        self.relay = on;
        self.relay_history.push((self.now.get(), on));
        Ok(())
    }
}

impl DisplayPort for SimPlate {
    fn clear(&mut self) -> Result<()> {
        self.display_ok()
    }

    fn print(&mut self, text: &str, at: Position) -> Result<()> {
        self.display_ok()?;
        self.prints.push((text.to_owned(), at));
        Ok(())
    }
}

impl InputPort for SimPlate {
    fn position(&mut self) -> Result<i32> {
        let now = self.now.get();
        Ok(self
            .turns
            .iter()
            .filter(|(at, _)| *at <= now)
            .max_by_key(|(at, _)| *at)
            .map_or(0, |(_, p)| *p))
    }

    fn button_pressed(&mut self) -> Result<bool> {
        if self.latched_button {
            return Ok(self.take_latched_press());
        }
        Ok(self.pressed_now())
    }

    fn run_enabled(&mut self) -> Result<bool> {
        Ok(self.run_off_at.is_none_or(|at| self.now.get() < at))
    }

    fn set_indicator(&mut self, color: Rgb) -> Result<()> {
        self.indicator_history.push(color);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn setpoints(&self) -> Vec<f32> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::SetpointChanged(sp) => Some(*sp),
                _ => None,
            })
            .collect()
    }

    pub fn visited(&self, state: AppState) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, AppEvent::StateChanged { to, .. } if *to == state))
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Assembly ──────────────────────────────────────────────────

pub type SimApp = AppController<SimPlate, SimClock, PidRegulator, RecordingSink>;

pub fn regulator(config: &PlateConfig) -> PidRegulator {
    PidRegulator::new(config.pid, config.pid_sample_period_ms, 0.0, 100.0)
}

/// Build an application over `script(SimPlate::new(..))`.
pub fn sim_app(config: PlateConfig, script: impl FnOnce(SimPlate) -> SimPlate) -> SimApp {
    let clock = SimClock::new();
    let plate = script(SimPlate::new(&clock));
    let reg = regulator(&config);
    AppController::new(plate, clock, reg, RecordingSink::default(), config)
}
