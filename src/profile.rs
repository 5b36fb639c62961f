//! Heating profiles.
//!
//! A profile is an ordered list of [`Phase`]s.  Each phase ramps the plate
//! linearly from wherever the previous phase ended to `target_c` over
//! `duration_secs`.  Two consecutive phases with the same target form a
//! flat hold (the second one is not ramped).

use core::fmt::Write;

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of phases in one profile.
pub const MAX_PHASES: usize = 8;
/// Maximum number of profiles offered in the reflow menu (2x2 grid on the LCD).
pub const MAX_PROFILES: usize = 4;
/// Longest profile name that still fits "[name]" in half an LCD row.
pub const MAX_NAME_LEN: usize = 6;
/// Name plus the selection brackets.
pub const MAX_LABEL_LEN: usize = MAX_NAME_LEN + 2;

/// One (target temperature, duration) segment of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Temperature to reach at the end of the phase (°C).
    pub target_c: f32,
    /// Time allotted to reach `target_c` (seconds, > 0).
    pub duration_secs: u32,
}

impl Phase {
    pub const fn new(target_c: f32, duration_secs: u32) -> Self {
        Self {
            target_c,
            duration_secs,
        }
    }
}

/// A named heating profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String<MAX_NAME_LEN>,
    pub phases: Vec<Phase, MAX_PHASES>,
}

impl Profile {
    /// Build a profile from a name and a phase list.
    ///
    /// Rejects names that do not fit the menu and phase lists longer than
    /// [`MAX_PHASES`].  Phase contents are checked by [`Profile::validate`].
    pub fn new(name: &str, phases: &[Phase]) -> Result<Self> {
        let mut n = String::new();
        n.push_str(name)
            .map_err(|()| Error::Config("profile name too long"))?;
        let phases =
            Vec::from_slice(phases).map_err(|()| Error::Config("too many profile phases"))?;
        Ok(Self { name: n, phases })
    }

    /// Check every phase against the safety ceiling.
    ///
    /// A phase must have a non-zero duration and a target strictly below
    /// `critical_c`, otherwise following it would either divide by zero or
    /// drive the plate into the safety cutoff on purpose.
    pub fn validate(&self, critical_c: f32) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::Config("profile name is empty"));
        }
        for phase in &self.phases {
            if phase.duration_secs == 0 {
                return Err(Error::Config("profile phase has zero duration"));
            }
            if !phase.target_c.is_finite() || phase.target_c < 0.0 {
                return Err(Error::Config("profile phase target is not a temperature"));
            }
            if phase.target_c >= critical_c {
                return Err(Error::Config("profile phase target reaches critical temperature"));
            }
        }
        Ok(())
    }

    /// Total nominal duration in seconds.
    pub fn total_secs(&self) -> u32 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }

    /// Menu label with selection brackets, e.g. `[SnCu]`.
    pub fn menu_label(&self) -> String<MAX_LABEL_LEN> {
        let mut label = String::new();
        let _ = write!(label, "[{}]", self.name);
        label
    }
}

/// Lead-free SnCu paste: soak at 150, ramp to 180, peak at 245 then hold.
pub const SNCU_PHASES: [Phase; 4] = [
    Phase::new(150.0, 90),
    Phase::new(180.0, 90),
    Phase::new(245.0, 45),
    Phase::new(245.0, 30),
];

/// The compiled-in profile table.
pub fn builtin_profiles() -> Vec<Profile, MAX_PROFILES> {
    let mut table = Vec::new();
    if let Ok(sncu) = Profile::new("SnCu", &SNCU_PHASES) {
        let _ = table.push(sncu);
    }
    table
}
