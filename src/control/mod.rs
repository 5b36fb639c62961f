//! Temperature control: PID law, periodic regulator, profile follower.

pub mod follower;
pub mod pid;
pub mod regulator;

pub use follower::{FollowOutcome, ProfileFollower, Progress, SetpointDriver};
pub use regulator::{ControlIo, PidRegulator, Regulator};
