//! Application controller — the top-level dispatcher.
//!
//! [`AppController`] owns the [`Controller`] context and runs the main
//! menu until the run-enable switch is released.  Each menu choice is a
//! flow (pre-heat, cool, reflow) written as straight-line code over the
//! context; heater and relay ownership are scoped guards, so every exit
//! path leaves them off.
//!
//! ```text
//!  InputPort ──▶ ┌───────────────────────────┐ ──▶ EventSink
//!                │       AppController        │
//!  SensorPort ─▶ │ Menu · Follower · Safety   │ ──▶ DisplayPort
//!                │        (Controller)        │
//! ActuatorPort ◀─└───────────────────────────┘
//! ```
//!
//! Any error that escapes a flow lands in [`AppController::run`], which
//! shuts everything down, enters `FatalFault` and asks for a restart.

use heapless::{String, Vec};
use log::{error, info};

use super::commands::MenuAction;
use super::context::Controller;
use super::events::{AppEvent, RestartReason};
use super::menu::{format_line, Line, MenuOption, MenuStateMachine};
use super::ports::{Clock, Console, EventSink, PlateHardware, Position, Rgb};
use super::state::AppState;
use crate::config::PlateConfig;
use crate::control::follower::{FollowOutcome, ProfileFollower, Progress};
use crate::control::regulator::Regulator;
use crate::error::Result;
use crate::profile::{MAX_LABEL_LEN, MAX_PROFILES};

/// How [`AppController::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// The run-enable switch was released; everything is off.
    Disabled,
    /// A fatal fault; the device must be restarted.
    Restart(RestartReason),
}

/// Temperature line shown while heating or cooling.
pub fn temperature_line(temp_c: Option<f32>) -> Line {
    match temp_c {
        Some(t) => format_line(format_args!("temp: {:3} C", t as i32)),
        None => format_line(format_args!("temp: --- C")),
    }
}

/// Profile progress line for display row 2.
pub fn progress_line(progress: &Progress) -> Line {
    match *progress {
        Progress::PhaseStarted {
            target_c,
            duration_secs,
            ..
        } => format_line(format_args!("Phs {:3} C..{:3}s", target_c as i32, duration_secs)),
        Progress::Substep {
            elapsed_secs,
            setpoint_c,
        } => format_line(format_args!("{:3}sec - {:3} C", elapsed_secs, setpoint_c as i32)),
        Progress::PhaseFinished { elapsed_secs, .. } => {
            format_line(format_args!("{:4}s end phase", elapsed_secs))
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppController
// ───────────────────────────────────────────────────────────────

pub struct AppController<H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    ctl: Controller<H, C, R, E>,
    menu: MenuStateMachine,
    follower: ProfileFollower,
}

impl<H, C, R, E> AppController<H, C, R, E>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    pub fn new(hw: H, clock: C, regulator: R, sink: E, config: PlateConfig) -> Self {
        let menu = MenuStateMachine::new(config.poll_interval_ms);
        let follower = ProfileFollower::new(
            config.substep_interval_secs,
            config.poll_interval_ms,
            config.ambient_fallback_c,
        );
        Self {
            ctl: Controller::new(hw, clock, regulator, sink, config),
            menu,
            follower,
        }
    }

    pub fn controller(&self) -> &Controller<H, C, R, E> {
        &self.ctl
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run menus and flows until the run switch is released or a fatal
    /// fault occurs.
    pub fn run(&mut self) -> RunOutcome {
        info!("Plancha controller started");
        self.ctl.emit(&AppEvent::Started(self.ctl.state()));
        match self.menu_loop() {
            Ok(()) => {
                info!("Run switch released, exiting");
                if let Err(e) = self.ctl.print("Exit!", Position::new(0, 1)) {
                    error!("Exit message failed: {e}");
                }
                if let Err(e) = self.ctl.set_indicator(Rgb::OFF) {
                    error!("Indicator off failed: {e}");
                }
                RunOutcome::Disabled
            }
            Err(e) => self.fail_safe(RestartReason::from(e)),
        }
    }

    /// Shutdown sequence for every fatal path.
    fn fail_safe(&mut self, reason: RestartReason) -> RunOutcome {
        error!("FATAL: {reason}");
        if let Err(e) = self.ctl.set_indicator(Rgb::OFF) {
            error!("Indicator off failed: {e}");
        }
        self.ctl.release_heater();
        self.ctl.transition(AppState::FatalFault);
        self.ctl.emit(&AppEvent::RestartRequested(reason));
        RunOutcome::Restart(reason)
    }

    fn menu_loop(&mut self) -> Result<()> {
        while self.ctl.run_enabled()? {
            self.ctl.transition(AppState::Menu);
            self.ctl.set_indicator(Rgb::GREEN)?;
            let options = MenuAction::MENU.map(|(key, label, at)| MenuOption::new(key, label, at));
            let action = self.menu.select_option(&mut self.ctl, &options, true)?;
            self.menu.wait_release(&mut self.ctl)?;
            if !self.ctl.run_enabled()? {
                break;
            }
            info!("Menu: {action:?}");
            match action {
                MenuAction::PreHeat => self.preheat()?,
                MenuAction::Cool => self.cool(None)?,
                MenuAction::Reflow => self.reflow()?,
            }
        }
        Ok(())
    }

    // ── Flows ─────────────────────────────────────────────────

    /// Hold a picked temperature until the button is pressed, then cool.
    fn preheat(&mut self) -> Result<()> {
        self.ctl.transition(AppState::PreHeatPickTemp);
        let range = self.ctl.config().preheat;
        let target = self.menu.pick_integer(
            &mut self.ctl,
            "Pre-Heat temp?",
            |v| format_line(format_args!("       {:03} C", v)),
            range.initial,
            range.min,
            range.max,
            range.step,
        )?;

        self.ctl.transition(AppState::PreHeatConfirm);
        let prompt = format_line(format_args!("Pre-heat {:3} C", target));
        let go = self.menu.confirm(&mut self.ctl, &prompt)?;
        self.menu.wait_release(&mut self.ctl)?;
        if !go {
            return Ok(());
        }

        self.ctl.transition(AppState::PreHeating);
        self.ctl.clear()?;
        self.ctl.print("Pre-heating...", Position::new(0, 0))?;
        self.ctl.set_indicator(Rgb::RED)?;
        let refresh_ms = self.ctl.config().display_refresh_ms;
        {
            let mut heat = self.ctl.heat();
            heat.set_setpoint(target as f32)?;
            loop {
                heat.sample_temperature()?;
                let line = temperature_line(heat.last_temperature());
                heat.print(&line, Position::new(0, 1))?;
                if heat.pause_unless_pressed(refresh_ms)? {
                    break;
                }
            }
        }
        self.ctl.wait_release()?;

        let stop_c = self.ctl.config().cooling_min_temp_c;
        self.cool(Some(stop_c))
    }

    /// Follow a profile, cool to the intermediate stop while the regulator
    /// idles at the hold setpoint, then cool fully.
    fn reflow(&mut self) -> Result<()> {
        self.ctl.transition(AppState::ReflowPickProfile);
        let profiles = self.ctl.config().profiles.clone();
        let mut labels: Vec<String<MAX_LABEL_LEN>, MAX_PROFILES> = Vec::new();
        for p in &profiles {
            let _ = labels.push(p.menu_label());
        }
        let mut options: Vec<MenuOption<'_, usize>, MAX_PROFILES> = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            // 2x2 grid
            let at = Position::new(if i % 2 == 0 { 0 } else { 8 }, (i / 2) as u8);
            let _ = options.push(MenuOption::new(i, label.as_str(), at));
        }
        let choice = self.menu.select_option(&mut self.ctl, &options[..], true)?;
        self.menu.wait_release(&mut self.ctl)?;
        let profile = &profiles[choice];
        profile.validate(self.ctl.config().critical_temp_c)?;

        self.ctl.transition(AppState::ReflowConfirm);
        let prompt = format_line(format_args!("{} reflow ?", profile.name));
        let go = self.menu.confirm(&mut self.ctl, &prompt)?;
        self.menu.wait_release(&mut self.ctl)?;
        if !go {
            return Ok(());
        }

        self.ctl.transition(AppState::Reflowing);
        self.ctl.clear()?;
        self.ctl.set_indicator(Rgb::RED)?;
        let title = format_line(format_args!("{} reflow...", profile.name));
        self.ctl.print(&title, Position::new(0, 0))?;
        info!(
            "Reflow '{}' started: {} phases, {} s",
            profile.name,
            profile.phases.len(),
            profile.total_secs()
        );

        let outcome = {
            let mut heat = self.ctl.heat();
            let outcome = self.follower.run_with_progress(&profile.phases, &mut *heat, |ctl, p| {
                if let Progress::PhaseStarted {
                    index,
                    target_c,
                    duration_secs,
                } = *p
                {
                    info!("Phase {index}: {target_c:.0} C in {duration_secs} s");
                    ctl.emit(&AppEvent::PhaseStarted {
                        index,
                        target_c,
                        duration_secs,
                    });
                }
                ctl.print(&progress_line(p), Position::new(0, 1))
            })?;
            if outcome == FollowOutcome::Completed {
                heat.transition(AppState::Cooling);
                let stop_c = heat.config().reflow_cooling_stop_c;
                cooling_loop(&mut *heat, Some(stop_c))?;
            }
            outcome
        };
        info!("Reflow '{}' {:?}", profile.name, outcome);

        let stop_c = self.ctl.config().cooling_min_temp_c;
        self.cool(Some(stop_c))
    }

    /// Cooling flow; `stop_below_c` of `None` means manual stop only.
    fn cool(&mut self, stop_below_c: Option<f32>) -> Result<()> {
        self.ctl.transition(AppState::Cooling);
        cooling_loop(&mut self.ctl, stop_below_c)
    }
}

/// Run the fan, refreshing the temperature, until the button is pressed or
/// the plate drops below `stop_below_c`.  The relay is released on every
/// exit path.
fn cooling_loop<H, C, R, E>(ctl: &mut Controller<H, C, R, E>, stop_below_c: Option<f32>) -> Result<()>
where
    H: PlateHardware,
    C: Clock,
    R: Regulator,
    E: EventSink,
{
    ctl.clear()?;
    ctl.print("Cooling...", Position::new(0, 0))?;
    ctl.set_indicator(Rgb::BLUE)?;
    let refresh_ms = ctl.config().display_refresh_ms;

    let mut fan = ctl.cooling()?;
    fan.wait_release()?;
    loop {
        let reading = fan.sample_temperature()?;
        let line = temperature_line(fan.last_temperature());
        fan.print(&line, Position::new(0, 1))?;
        if let (Some(t), Some(stop)) = (reading, stop_below_c) {
            if t < stop {
                info!("Plate below {stop:.0} C, cooling done");
                break;
            }
        }
        if fan.pause_unless_pressed(refresh_ms)? {
            break;
        }
    }
    fan.wait_release()
}
