//! Inbound commands to the application controller.
//!
//! The operator's only input device is the encoder, so every command
//! arrives as a main-menu selection.

use super::ports::Position;

/// Actions offered on the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Hold the plate at a picked temperature until the button is pressed.
    PreHeat,
    /// Run the cooling fan until the button is pressed.
    Cool,
    /// Follow a reflow profile, then cool down.
    Reflow,
}

impl MenuAction {
    /// Main-menu layout on the 16x2 display.
    pub const MENU: [(Self, &'static str, Position); 3] = [
        (Self::PreHeat, "[Pre-Heat]", Position::new(0, 0)),
        (Self::Cool, "[Cool]", Position::new(10, 0)),
        (Self::Reflow, "[Reflow]", Position::new(0, 1)),
    ];
}
