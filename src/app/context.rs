//! Controller context — the single owner of hardware, clock and regulator.
//!
//! ```text
//!   ┌──────────────────────── Controller ────────────────────────┐
//!   │  hw (PlateHardware)   clock   regulator   safety   sink    │
//!   │                                                            │
//!   │  pause(ms) ─┬─ regulator.service(now, PlantLink) ─┐        │
//!   │             └─ clock.sleep_ms(slice) ◀────────────┘        │
//!   └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on one thread.  Time only passes inside [`Controller::pause`],
//! which sleeps in slices bounded by the regulator's next sample, so the
//! menus, the profile follower and the PID all interleave on the same loop.
//!
//! Heater ownership is scoped: [`Controller::heat`] returns a
//! [`HeatSession`] whose `Drop` stops the regulator and zeroes the heater,
//! and [`Controller::cooling`] returns a [`CoolingSession`] that releases
//! the fan relay.  Every exit path (return, `?`, cancellation) passes
//! through those drops.

use core::ops::{Deref, DerefMut};

use log::{error, info, warn};

use super::events::{AppEvent, Sample};
use super::ports::{Clock, Console, EventSink, PlateHardware, Position, Rgb};
use super::state::AppState;
use crate::config::PlateConfig;
use crate::control::follower::SetpointDriver;
use crate::control::regulator::{ControlIo, Regulator};
use crate::error::{Error, Result};
use crate::safety::SafetySupervisor;

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller<H, C, R, E> {
    hw: H,
    clock: C,
    regulator: R,
    sink: E,
    safety: SafetySupervisor,
    config: PlateConfig,
    state: AppState,
    last_temp_c: Option<f32>,
    setpoint_since_ms: u64,
}

impl<H, C, R, E> Controller<H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    pub fn new(hw: H, clock: C, regulator: R, sink: E, config: PlateConfig) -> Self {
        let safety = SafetySupervisor::new(config.critical_temp_c);
        let now = clock.now_ms();
        Self {
            hw,
            clock,
            regulator,
            sink,
            safety,
            config,
            state: AppState::Menu,
            last_temp_c: None,
            setpoint_since_ms: now,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &PlateConfig {
        &self.config
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn regulator(&self) -> &R {
        &self.regulator
    }

    pub fn safety(&self) -> &SafetySupervisor {
        &self.safety
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Last successful thermocouple reading.
    pub fn last_temperature(&self) -> Option<f32> {
        self.last_temp_c
    }

    // ── State & events ────────────────────────────────────────

    pub fn emit(&mut self, event: &AppEvent) {
        self.sink.emit(event);
    }

    /// Move to `to`, logging and emitting the transition.
    pub fn transition(&mut self, to: AppState) {
        let from = self.state;
        if from == to {
            return;
        }
        info!("State transition: {from} -> {to}");
        self.state = to;
        self.sink.emit(&AppEvent::StateChanged { from, to });
    }

    // ── Inputs & indicator ────────────────────────────────────

    pub fn run_enabled(&mut self) -> Result<bool> {
        self.hw.run_enabled()
    }

    pub fn set_indicator(&mut self, color: Rgb) -> Result<()> {
        self.hw.set_indicator(color)
    }

    /// Block (servicing the regulator) until the button is released.
    pub fn wait_release(&mut self) -> Result<()> {
        while self.hw.button_pressed()? {
            self.pause(self.config.button_poll_ms)?;
        }
        Ok(())
    }

    /// Pause up to `ms`, returning early (with `true`) on a button press.
    pub fn pause_unless_pressed(&mut self, ms: u32) -> Result<bool> {
        let deadline = self.clock.now_ms() + u64::from(ms);
        loop {
            if self.hw.button_pressed()? {
                return Ok(true);
            }
            let now = self.clock.now_ms();
            if now >= deadline {
                return Ok(false);
            }
            let slice = (deadline - now).min(u64::from(self.config.button_poll_ms));
            self.pause(slice as u32)?;
        }
    }

    // ── Regulation ────────────────────────────────────────────

    /// Apply a new regulator setpoint, arming the regulator if it was idle.
    pub fn set_setpoint(&mut self, setpoint_c: f32) -> Result<()> {
        let now = self.clock.now_ms();
        self.regulator.set_setpoint(setpoint_c, now);
        self.setpoint_since_ms = now;
        info!("Setpoint {setpoint_c:.0} C");
        self.sink.emit(&AppEvent::SetpointChanged(setpoint_c));
        Ok(())
    }

    /// Stop the regulator, then de-energise the heater.
    pub fn stop_regulation(&mut self) -> Result<()> {
        self.regulator.stop();
        self.hw.set_heater_duty(0)
    }

    /// Best-effort [`stop_regulation`](Self::stop_regulation) for drop and
    /// fault paths, where there is no caller left to report to.
    pub fn release_heater(&mut self) {
        self.regulator.stop();
        if let Err(e) = self.hw.set_heater_duty(0) {
            error!("Heater shutdown failed: {e}");
        }
    }

    /// Sleep `ms`, servicing the regulator whenever a sample falls due.
    pub fn pause(&mut self, ms: u32) -> Result<()> {
        let deadline = self.clock.now_ms() + u64::from(ms);
        loop {
            self.service_regulator()?;
            let now = self.clock.now_ms();
            if now >= deadline {
                return Ok(());
            }
            let mut slice = deadline - now;
            if let Some(next) = self.regulator.next_sample_at() {
                slice = slice.min(next.saturating_sub(now).max(1));
            }
            self.clock.sleep_ms(slice as u32);
        }
    }

    /// Run a due regulator sample.  A safety trip (or any other error in
    /// the sample path) leaves the regulator stopped and the heater at zero.
    fn service_regulator(&mut self) -> Result<()> {
        let now = self.clock.now_ms();
        let setpoint_c = self.regulator.setpoint();
        let elapsed_secs = (now.saturating_sub(self.setpoint_since_ms) / 1000) as u32;
        let mut link = PlantLink {
            hw: &mut self.hw,
            safety: &mut self.safety,
            sink: &mut self.sink,
            last_temp_c: &mut self.last_temp_c,
            setpoint_c,
            elapsed_secs,
        };
        if let Err(e) = self.regulator.service(now, &mut link) {
            self.release_heater();
            return Err(e);
        }
        Ok(())
    }

    /// Read and safety-check the plate outside the regulator's sample path
    /// (cooling loop, display refresh).
    pub fn sample_temperature(&mut self) -> Result<Option<f32>> {
        let reading = read_checked(
            &mut self.hw,
            &mut self.safety,
            &mut self.sink,
            &mut self.last_temp_c,
        );
        if reading.is_err() {
            self.release_heater();
        }
        reading
    }

    // ── Scoped actuator sessions ──────────────────────────────

    /// Take ownership of the heater for a flow.
    pub fn heat(&mut self) -> HeatSession<'_, H, C, R, E> {
        HeatSession { ctl: self }
    }

    /// Energise the cooling relay until the returned session is dropped.
    pub fn cooling(&mut self) -> Result<CoolingSession<'_, H, C, R, E>> {
        self.hw.set_cooling_relay(true)?;
        info!("Cooling relay on");
        Ok(CoolingSession { ctl: self })
    }
}

/// One thermocouple read: record it, report faults, run the safety check.
fn read_checked<H, E>(
    hw: &mut H,
    safety: &mut SafetySupervisor,
    sink: &mut E,
    last_temp_c: &mut Option<f32>,
) -> Result<Option<f32>>
where
    H: PlateHardware,
    E: EventSink,
{
    let reading = match hw.read_temperature() {
        Ok(t) => {
            *last_temp_c = Some(t);
            Some(t)
        }
        Err(e) => {
            warn!("Thermocouple: {e}, skipping sample");
            sink.emit(&AppEvent::SensorFault(e));
            None
        }
    };
    if let Some(trip) = safety.check(reading) {
        sink.emit(&AppEvent::SafetyTrip(trip));
        return Err(Error::Safety(trip));
    }
    Ok(reading)
}

// ───────────────────────────────────────────────────────────────
// Regulator I/O
// ───────────────────────────────────────────────────────────────

/// Short-lived borrow of the controller handed to the regulator for one
/// sample.
struct PlantLink<'a, H, E> {
    hw: &'a mut H,
    safety: &'a mut SafetySupervisor,
    sink: &'a mut E,
    last_temp_c: &'a mut Option<f32>,
    setpoint_c: Option<f32>,
    elapsed_secs: u32,
}

impl<H: PlateHardware, E: EventSink> ControlIo for PlantLink<'_, H, E> {
    fn measure(&mut self) -> Result<Option<f32>> {
        let reading = read_checked(self.hw, self.safety, self.sink, self.last_temp_c)?;
        if let (Some(setpoint_c), Some(temperature_c)) = (self.setpoint_c, reading) {
            if setpoint_c > 0.0 {
                self.sink.emit(&AppEvent::Sample(Sample {
                    elapsed_secs: self.elapsed_secs,
                    setpoint_c,
                    temperature_c,
                }));
            }
        }
        Ok(reading)
    }

    fn apply(&mut self, duty: u8) -> Result<()> {
        self.hw.set_heater_duty(duty)
    }
}

// ───────────────────────────────────────────────────────────────
// Scoped sessions
// ───────────────────────────────────────────────────────────────

/// Heater-on scope.  Dropping it stops the regulator and zeroes the duty.
pub struct HeatSession<'a, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    ctl: &'a mut Controller<H, C, R, E>,
}

impl<H, C, R, E> Deref for HeatSession<'_, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    type Target = Controller<H, C, R, E>;

    fn deref(&self) -> &Self::Target {
        self.ctl
    }
}

impl<H, C, R, E> DerefMut for HeatSession<'_, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctl
    }
}

impl<H, C, R, E> Drop for HeatSession<'_, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    fn drop(&mut self) {
        self.ctl.release_heater();
    }
}

/// Cooling-relay scope.  Dropping it releases the relay.
pub struct CoolingSession<'a, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    ctl: &'a mut Controller<H, C, R, E>,
}

impl<H, C, R, E> Deref for CoolingSession<'_, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    type Target = Controller<H, C, R, E>;

    fn deref(&self) -> &Self::Target {
        self.ctl
    }
}

impl<H, C, R, E> DerefMut for CoolingSession<'_, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctl
    }
}

impl<H, C, R, E> Drop for CoolingSession<'_, H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    fn drop(&mut self) {
        match self.ctl.hw.set_cooling_relay(false) {
            Ok(()) => info!("Cooling relay off"),
            Err(e) => error!("Cooling relay release failed: {e}"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Menu and profile-follower views
// ───────────────────────────────────────────────────────────────

impl<H, C, R, E> Console for Controller<H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    fn clear(&mut self) -> Result<()> {
        self.hw.clear()
    }

    fn print(&mut self, text: &str, at: Position) -> Result<()> {
        self.hw.print(text, at)
    }

    fn position(&mut self) -> Result<i32> {
        self.hw.position()
    }

    fn button_pressed(&mut self) -> Result<bool> {
        self.hw.button_pressed()
    }

    fn idle(&mut self, ms: u32) -> Result<()> {
        self.pause(ms)
    }
}

impl<H, C, R, E> SetpointDriver for Controller<H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn temperature(&mut self) -> Result<Option<f32>> {
        self.sample_temperature()
    }

    fn apply_setpoint(&mut self, setpoint_c: f32) -> Result<()> {
        self.set_setpoint(setpoint_c)
    }

    fn stop_regulation(&mut self) -> Result<()> {
        Controller::stop_regulation(self)
    }

    /// Run switch still on and no cancel press.
    fn keep_running(&mut self) -> Result<bool> {
        Ok(self.hw.run_enabled()? && !self.hw.button_pressed()?)
    }

    fn pause(&mut self, ms: u32) -> Result<()> {
        Controller::pause(self, ms)
    }
}
