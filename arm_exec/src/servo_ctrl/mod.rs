//! Servo control module
//!
//! Converts normalised position demands into kinematically limited motion for each of the arm's
//! servos. Each demand is expanded into a trajectory profile which respects the servo's speed and
//! acceleration limits, and the profile is followed one sample per cycle until the servo settles
//! on its target.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod profile;
mod servo;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
pub use params::*;
pub use profile::*;
pub use servo::*;
pub use state::*;

use comms_if::eqpt::arm::ServoId;

// Re-export, the servo count is fixed by the equipment interface
pub use comms_if::eqpt::arm::NUM_SERVOS;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lowest duty count that may be commanded to any servo.
///
/// Corresponds to a 0.5 ms pulse at 50 Hz on a 16 bit duty scale.
pub const ABS_MIN_DUTY: u16 = 1638;

/// Highest duty count that may be commanded to any servo.
///
/// Corresponds to a 2.5 ms pulse at 50 Hz on a 16 bit duty scale.
pub const ABS_MAX_DUTY: u16 = 8192;

/// Maximum number of samples held in a servo's trajectory profile.
///
/// If a planned trajectory is longer than this the oldest samples are dropped, so the servo will
/// skip the start of the motion.
pub const MAX_PROFILE_STEPS: usize = 200;

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during ServoCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ServoCtrlError {
    #[error("Timestep must be a positive number of seconds, got {0}")]
    InvalidTimestep(f64),

    #[error("Kinematic limits must be positive, got max speed {0} and max accel {1}")]
    InvalidLimits(f64, f64),

    #[error("Demand for {0:?} is not a finite number: {1}")]
    NonFiniteDemand(ServoId, f64),
}
