//! Application core — pure domain logic, zero direct I/O.
//!
//! This module contains the rules of the hot plate: menus, the pre-heat,
//! cooling and reflow flows, and the shared controller context that
//! interleaves them with the regulator.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod commands;
pub mod context;
pub mod events;
pub mod menu;
pub mod ports;
pub mod service;
pub mod state;
