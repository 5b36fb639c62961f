//! `ProfileFollower` driving the real controller context and regulator.

use plancha::app::context::Controller;
use plancha::app::events::AppEvent;
use plancha::config::PlateConfig;
use plancha::control::follower::{FollowOutcome, ProfileFollower};
use plancha::control::regulator::{PidRegulator, Regulator};
use plancha::error::Error;
use plancha::profile::Phase;

use crate::mock_hw::{regulator, RecordingSink, SimClock, SimPlate};

type SimController = Controller<SimPlate, SimClock, PidRegulator, RecordingSink>;

fn controller(script: impl FnOnce(SimPlate) -> SimPlate) -> SimController {
    let config = PlateConfig::default();
    let clock = SimClock::new();
    let plate = script(SimPlate::new(&clock));
    let reg = regulator(&config);
    Controller::new(plate, clock, reg, RecordingSink::default(), config)
}

fn follower() -> ProfileFollower {
    ProfileFollower::new(5, 100, 25.0)
}

const RAMP_THEN_HOLD: [Phase; 2] = [Phase::new(60.0, 20), Phase::new(60.0, 10)];

#[test]
fn ramp_then_hold_setpoints() {
    let mut ctl = controller(|p| p);

    let outcome = follower().run(&RAMP_THEN_HOLD, &mut ctl).unwrap();

    assert_eq!(outcome, FollowOutcome::Completed);
    // step = (60 - 25) / 20 * 5 = 8.75; the hold applies its target once.
    assert_eq!(ctl.sink().setpoints(), vec![33.0, 42.0, 51.0, 60.0, 60.0, 1.0]);
    assert_eq!(ctl.now_ms(), 30_000);
    assert!(ctl.regulator().is_running());
    assert!(ctl.hw().max_duty() > 0);
}

#[test]
fn sample_clock_restarts_on_each_setpoint() {
    let mut ctl = controller(|p| p);

    follower().run(&RAMP_THEN_HOLD, &mut ctl).unwrap();

    let first_at_42 = ctl
        .sink()
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Sample(s) if s.setpoint_c == 42.0 => Some(*s),
            _ => None,
        })
        .unwrap();
    assert_eq!(first_at_42.elapsed_secs, 0);
}

#[test]
fn button_press_cancels_and_stops_regulation() {
    let mut ctl = controller(|p| p.press_at(7_000));

    let outcome = follower().run(&RAMP_THEN_HOLD, &mut ctl).unwrap();

    assert_eq!(outcome, FollowOutcome::Cancelled);
    assert_eq!(ctl.sink().setpoints(), vec![33.0, 42.0]);
    assert!(!ctl.regulator().is_running());
    assert_eq!(ctl.hw().duty(), 0);
    assert_eq!(ctl.now_ms(), 7_000);
}

#[test]
fn overheat_during_ramp_aborts_with_heater_off() {
    let mut ctl = controller(|p| p.overheat_from(3_000, 390.0));

    let err = follower().run(&RAMP_THEN_HOLD, &mut ctl).unwrap_err();

    assert!(matches!(err, Error::Safety(t) if t.measured_c >= 380.0));
    assert!(ctl.safety().is_tripped());
    assert!(!ctl.regulator().is_running());
    assert_eq!(ctl.hw().duty(), 0);
}

#[test]
fn unreadable_sensor_ramps_from_ambient_fallback() {
    let mut ctl = controller(|p| p.sensor_fault(0, 1));

    follower()
        .run(&[Phase::new(125.0, 50)], &mut ctl)
        .unwrap();

    // (125 - 25) / 50 * 5 = 10 per substep
    assert_eq!(ctl.sink().setpoints().first(), Some(&35.0));
}
