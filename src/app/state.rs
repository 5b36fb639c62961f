//! Application state identity.
//!
//! ```text
//!            ┌──────────────── cancel / done ─────────────────┐
//!            ▼                                                 │
//!   ┌──────┐   ┌─────────────────┐   ┌────────────────┐   ┌────┴──────┐
//!   │ Menu │──▶│ PreHeatPickTemp │──▶│ PreHeatConfirm │──▶│ PreHeating│──▶ Cooling
//!   └──┬───┘   └─────────────────┘   └────────────────┘   └───────────┘
//!      │       ┌───────────────────┐   ┌───────────────┐   ┌───────────┐
//!      ├──────▶│ ReflowPickProfile │──▶│ ReflowConfirm │──▶│ Reflowing │──▶ Cooling
//!      │       └───────────────────┘   └───────────────┘   └───────────┘
//!      └──────▶ Cooling
//!
//!   any state ── safety trip / unhandled error ──▶ FatalFault (terminal)
//! ```

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    Menu,
    PreHeatPickTemp,
    PreHeatConfirm,
    PreHeating,
    Cooling,
    ReflowPickProfile,
    ReflowConfirm,
    Reflowing,
    FatalFault,
}

impl AppState {
    /// Heater may be energised in this state.
    pub fn is_heating(self) -> bool {
        matches!(self, Self::PreHeating | Self::Reflowing)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::FatalFault
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Menu => "Menu",
            Self::PreHeatPickTemp => "PreHeatPickTemp",
            Self::PreHeatConfirm => "PreHeatConfirm",
            Self::PreHeating => "PreHeating",
            Self::Cooling => "Cooling",
            Self::ReflowPickProfile => "ReflowPickProfile",
            Self::ReflowConfirm => "ReflowConfirm",
            Self::Reflowing => "Reflowing",
            Self::FatalFault => "FatalFault",
        };
        f.write_str(name)
    }
}
