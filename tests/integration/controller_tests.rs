//! End-to-end flows through `AppController::run` on the simulated plate.

use plancha::app::events::{AppEvent, RestartReason};
use plancha::app::ports::{Position, Rgb};
use plancha::app::service::RunOutcome;
use plancha::app::state::AppState;
use plancha::config::PlateConfig;
use plancha::control::regulator::Regulator;
use plancha::error::{BusError, Error};
use plancha::profile::{Phase, Profile};

use crate::mock_hw::{sim_app, SimPlate, AMBIENT_C};

#[test]
fn run_switch_off_exits_without_touching_actuators() {
    let mut app = sim_app(PlateConfig::default(), |p| p.run_off_at(0));

    assert_eq!(app.run(), RunOutcome::Disabled);

    let hw = app.controller().hw();
    assert!(hw.printed_at("Exit!", Position::new(0, 1)));
    assert_eq!(hw.indicator_history, vec![Rgb::OFF]);
    assert!(hw.duty_history.is_empty());
    assert!(hw.relay_history.is_empty());
}

#[test]
fn cool_runs_fan_until_button() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.turn_to(200, 1) // [Cool]
            .press_at(500)
            .press_at(2_000) // stop cooling
            .run_off_at(2_500)
            .press_at(3_000) // leave the menu
    });

    assert_eq!(app.run(), RunOutcome::Disabled);

    let ctl = app.controller();
    let hw = ctl.hw();
    assert!(hw.printed_at("[Cool]", Position::new(10, 0)));
    assert!(hw.printed_at(" Pre-Heat ", Position::new(0, 0)));
    assert!(hw.printed_at("Cooling...", Position::new(0, 0)));
    assert!(hw.printed_at("temp:  25 C", Position::new(0, 1)));
    assert!(hw.indicator_history.contains(&Rgb::BLUE));
    let relay: Vec<bool> = hw.relay_history.iter().map(|(_, on)| *on).collect();
    assert_eq!(relay, vec![true, false]);
    assert_eq!(hw.max_duty(), 0);
    assert!(ctl.sink().visited(AppState::Cooling));
    assert!(!ctl.sink().visited(AppState::PreHeating));
}

#[test]
fn preheat_holds_target_then_cools_to_minimum() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.press_at(100) // [Pre-Heat]
            .turn_to(500, 3) // one step, however far the knob went
            .press_at(1_000)
            .press_at(2_000) // [Yes]
            .press_at(150_000) // stop heating
            .run_off_at(250_000)
            .press_at(260_000)
    });

    assert_eq!(app.run(), RunOutcome::Disabled);

    let ctl = app.controller();
    let hw = ctl.hw();
    let sink = ctl.sink();
    assert!(hw.printed_at("       105 C", Position::new(0, 1)));
    assert!(hw.printed_at("Pre-heat 105 C", Position::new(0, 0)));
    assert!(hw.printed_at("Pre-heating...", Position::new(0, 0)));
    assert_eq!(sink.setpoints(), vec![105.0]);
    assert!(sink.count(|e| matches!(e, AppEvent::Sample(_))) > 100);

    assert!(hw.max_duty() > 0, "heater never energised");
    assert_eq!(hw.duty(), 0);
    assert!(hw.peak_c > 80.0 && hw.peak_c < 150.0, "peak {}", hw.peak_c);

    // Relay on after the press, off on its own once under 35 °C.
    assert_eq!(hw.relay_history.len(), 2);
    let (on_at, on) = hw.relay_history[0];
    let (off_at, off) = hw.relay_history[1];
    assert!(on && !off);
    assert!(on_at >= 150_000);
    assert!(off_at < 260_000, "cooling did not stop by itself");
    assert!(ctl.last_temperature().is_some_and(|t| t < 35.0));
}

#[test]
fn one_shot_press_stops_manual_cooling() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.latched_button()
            .turn_to(200, 1)
            .press_at(500)
            .press_at(2_000)
            .run_off_at(2_500)
            .press_at(3_000)
    });

    assert_eq!(app.run(), RunOutcome::Disabled);

    let hw = app.controller().hw();
    let relay: Vec<bool> = hw.relay_history.iter().map(|(_, on)| *on).collect();
    assert_eq!(relay, vec![true, false]);
    assert!(hw.relay_history[1].0 < 2_500, "press ignored");
    assert!(!hw.relay_on());
}

#[test]
fn one_shot_press_stops_preheat() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.latched_button()
            .press_at(100)
            .turn_to(500, 3)
            .press_at(1_000)
            .press_at(2_000)
            .press_at(150_000)
            .run_off_at(250_000)
            .press_at(260_000)
    });

    assert_eq!(app.run(), RunOutcome::Disabled);

    let ctl = app.controller();
    let hw = ctl.hw();
    assert_eq!(ctl.sink().setpoints(), vec![105.0]);
    assert_eq!(hw.duty(), 0);
    assert!(!ctl.regulator().is_running());
    let (on_at, on) = hw.relay_history[0];
    assert!(on);
    assert!((150_000..150_500).contains(&on_at), "relay on at {on_at}");
    assert!(!hw.relay_on());
}

#[test]
fn preheat_cancelled_at_confirm_returns_to_menu() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.press_at(100)
            .press_at(1_000)
            .turn_to(1_500, 1) // [No]
            .press_at(2_000)
            .run_off_at(2_500)
            .press_at(3_000)
    });

    assert_eq!(app.run(), RunOutcome::Disabled);

    let ctl = app.controller();
    assert!(ctl.hw().duty_history.is_empty());
    assert!(ctl.hw().relay_history.is_empty());
    assert!(ctl.sink().setpoints().is_empty());
    assert!(!ctl.sink().visited(AppState::PreHeating));
}

#[test]
fn overheat_trips_once_and_requests_restart() {
    let config = PlateConfig::default();
    let mut app = sim_app(config, |p| {
        p.press_at(100)
            .press_at(1_000)
            .press_at(2_000)
            .overheat_from(5_000, 385.0)
    });

    let outcome = app.run();

    let RunOutcome::Restart(RestartReason::SafetyTrip(trip)) = outcome else {
        panic!("expected a safety restart, got {outcome:?}");
    };
    assert!((trip.measured_c - 385.0).abs() < f32::EPSILON);
    assert!((trip.limit_c - 380.0).abs() < f32::EPSILON);

    let ctl = app.controller();
    assert_eq!(ctl.state(), AppState::FatalFault);
    assert!(ctl.safety().is_tripped());
    assert_eq!(ctl.hw().duty(), 0);
    assert_eq!(ctl.hw().duty_history.last(), Some(&0));
    assert!(ctl.hw().relay_history.is_empty());
    assert_eq!(
        ctl.sink()
            .count(|e| matches!(e, AppEvent::RestartRequested(_))),
        1
    );
    assert!(ctl.sink().count(|e| matches!(e, AppEvent::SafetyTrip(_))) >= 1);
}

#[test]
fn overheat_while_cooling_releases_relay_and_restarts() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.turn_to(200, 1).press_at(500).overheat_from(3_000, 385.0)
    });

    let outcome = app.run();

    assert!(
        matches!(outcome, RunOutcome::Restart(RestartReason::SafetyTrip(_))),
        "{outcome:?}"
    );
    let ctl = app.controller();
    let hw = ctl.hw();
    assert_eq!(ctl.state(), AppState::FatalFault);
    let relay: Vec<bool> = hw.relay_history.iter().map(|(_, on)| *on).collect();
    assert_eq!(relay, vec![true, false]);
    assert!(!hw.relay_on());
    assert_eq!(hw.max_duty(), 0);
    assert_eq!(hw.indicator_history.last(), Some(&Rgb::OFF));
    assert_eq!(
        ctl.sink()
            .count(|e| matches!(e, AppEvent::RestartRequested(_))),
        1
    );
}

#[test]
fn display_failure_while_heating_shuts_down_and_restarts() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.press_at(100)
            .press_at(1_000)
            .press_at(2_000)
            .display_fault_from(10_000)
    });

    let outcome = app.run();

    assert_eq!(
        outcome,
        RunOutcome::Restart(RestartReason::Unhandled(Error::Display(BusError::I2c)))
    );
    let ctl = app.controller();
    let hw = ctl.hw();
    assert!(hw.max_duty() > 0, "heater never energised");
    assert_eq!(hw.duty(), 0);
    assert_eq!(hw.duty_history.last(), Some(&0));
    assert_eq!(hw.indicator_history.last(), Some(&Rgb::OFF));
    assert!(!ctl.regulator().is_running());
    assert_eq!(ctl.state(), AppState::FatalFault);
    assert!(!ctl.safety().is_tripped());
    assert_eq!(
        ctl.sink().count(|e| matches!(
            e,
            AppEvent::RestartRequested(RestartReason::Unhandled(_))
        )),
        1
    );
    assert_eq!(
        ctl.sink()
            .count(|e| matches!(e, AppEvent::RestartRequested(_))),
        1
    );
}

#[test]
fn sensor_fault_shows_dashes_and_keeps_running() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        p.sensor_fault(0, 10_000)
            .turn_to(200, 1)
            .press_at(500)
            .press_at(5_000)
            .run_off_at(5_500)
            .press_at(6_000)
    });

    assert_eq!(app.run(), RunOutcome::Disabled);

    let ctl = app.controller();
    assert!(ctl.hw().printed_at("temp: --- C", Position::new(0, 1)));
    assert!(ctl.sink().count(|e| matches!(e, AppEvent::SensorFault(_))) > 0);
    assert_eq!(
        ctl.sink()
            .count(|e| matches!(e, AppEvent::RestartRequested(_))),
        0
    );
}

// ── Reflow ────────────────────────────────────────────────────

/// Main menu one step back lands on `[Reflow]`; the only profile and
/// `[Yes]` are preselected.
fn reflow_script(p: SimPlate) -> SimPlate {
    p.turn_to(50, -1).press_at(500).press_at(1_500).press_at(2_500)
}

#[test]
fn reflow_follows_sncu_and_cools_in_two_stages() {
    let mut app = sim_app(PlateConfig::default(), |p| {
        reflow_script(p).run_off_at(600_000).press_at(610_000)
    });

    assert_eq!(app.run(), RunOutcome::Disabled);

    let ctl = app.controller();
    let hw = ctl.hw();
    let sink = ctl.sink();

    assert!(hw.printed_at("[SnCu]", Position::new(0, 0)));
    assert!(hw.printed("SnCu reflow ?"));
    assert!(hw.printed_at("SnCu reflow...", Position::new(0, 0)));
    assert!(hw.printed_at("Phs 150 C.. 90s", Position::new(0, 1)));

    let phases: Vec<usize> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::PhaseStarted { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec![0, 1, 2, 3]);

    let setpoints = sink.setpoints();
    // 25 + (150 - 25) / 90 * 5 = 31.9, truncated
    assert_eq!(setpoints.first(), Some(&31.0));
    assert_eq!(setpoints.last(), Some(&1.0));
    assert!(setpoints.contains(&245.0));
    assert!(setpoints.iter().all(|&sp| sp <= 245.0));

    // The regulator keeps logging at the hold setpoint while the fan runs.
    assert!(
        sink.count(|e| matches!(e, AppEvent::Sample(s) if s.setpoint_c == 1.0)) > 0
    );

    assert!(hw.peak_c > 150.0 && hw.peak_c < 380.0, "peak {}", hw.peak_c);
    assert_eq!(hw.duty(), 0);

    // Stage one stops under 100 °C, stage two under 35 °C.
    let relay: Vec<bool> = hw.relay_history.iter().map(|(_, on)| *on).collect();
    assert_eq!(relay, vec![true, false, true, false]);
    assert!(hw.relay_history[3].0 < 600_000);
    assert!(ctl.last_temperature().is_some_and(|t| t < 35.0 && t > AMBIENT_C - 1.0));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::RestartRequested(_))),
        0
    );
}

#[test]
fn reflow_cancelled_by_run_switch_skips_first_cooling_stage() {
    let mut app = sim_app(PlateConfig::default(), |p| reflow_script(p).run_off_at(30_000));

    assert_eq!(app.run(), RunOutcome::Disabled);

    let ctl = app.controller();
    let hw = ctl.hw();
    assert!(ctl.sink().visited(AppState::Reflowing));
    assert!(!ctl.sink().setpoints().contains(&1.0));
    assert!(hw.max_duty() > 0);
    assert_eq!(hw.duty(), 0);
    let relay: Vec<bool> = hw.relay_history.iter().map(|(_, on)| *on).collect();
    assert_eq!(relay, vec![true, false]);
    assert!(!hw.relay_on());
    assert!(!ctl.regulator().is_running());
}

#[test]
fn profile_reaching_critical_temperature_is_refused_before_heating() {
    let mut config = PlateConfig::default();
    config.profiles.clear();
    config
        .profiles
        .push(Profile::new("Hot", &[Phase::new(390.0, 60)]).unwrap())
        .unwrap();
    let mut app = sim_app(config, reflow_script);

    let outcome = app.run();

    assert!(
        matches!(
            outcome,
            RunOutcome::Restart(RestartReason::Unhandled(Error::Config(_)))
        ),
        "{outcome:?}"
    );
    let ctl = app.controller();
    assert!(ctl.sink().setpoints().is_empty());
    assert_eq!(ctl.hw().max_duty(), 0);
    assert!(!ctl.hw().printed("Hot reflow ?"));
    assert!(!ctl.sink().visited(AppState::Reflowing));
    assert_eq!(ctl.state(), AppState::FatalFault);
}
