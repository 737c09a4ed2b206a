//! Parameters structure for ServoCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use thiserror::Error;

use super::NUM_SERVOS;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for Servo Control.
///
/// Arrays are indexed by [`ServoId::index`](comms_if::eqpt::arm::ServoId::index), i.e. in the
/// order `[ShoulderYaw, ShoulderPitch, Elbow, WristPitch, WristRoll, Grabber]`.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    // ---- MAPPING ----
    /// Fraction of the absolute duty range output at normalised position 0.
    ///
    /// May be greater than `safe_max` for servos whose direction of travel is reversed.
    pub safe_min: [f64; NUM_SERVOS],

    /// Fraction of the absolute duty range output at normalised position 1.
    pub safe_max: [f64; NUM_SERVOS],

    // ---- KINEMATIC LIMITS ----
    /// Maximum speed of each servo.
    ///
    /// The travel per cycle is capped at `max_speed * timestep`.
    pub max_speed: [f64; NUM_SERVOS],

    /// Maximum acceleration of each servo.
    ///
    /// The speed change per cycle is `max_accel * timestep`.
    pub max_accel: [f64; NUM_SERVOS],

    // ---- STARTUP ----
    /// Normalised position each servo assumes at startup.
    pub initial_pos_norm: [f64; NUM_SERVOS],
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Safe duty fractions for servo {0} must lie in [0, 1], got {1} and {2}")]
    SafeFracOutOfRange(usize, f64, f64),

    #[error("Safe duty fractions for servo {0} must not be equal")]
    SafeFracsEqual(usize),

    #[error("Kinematic limits for servo {0} must be positive, got speed {1} and accel {2}")]
    NonPositiveLimits(usize, f64, f64),

    #[error("Initial position for servo {0} must lie in [0, 1], got {1}")]
    InitialPosOutOfRange(usize, f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        for i in 0..NUM_SERVOS {
            let (min, max) = (self.safe_min[i], self.safe_max[i]);

            if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) {
                return Err(ParamsError::SafeFracOutOfRange(i, min, max));
            }

            if min == max {
                return Err(ParamsError::SafeFracsEqual(i));
            }

            let (speed, accel) = (self.max_speed[i], self.max_accel[i]);

            if !speed.is_finite() || !accel.is_finite() || speed <= 0.0 || accel <= 0.0 {
                return Err(ParamsError::NonPositiveLimits(i, speed, accel));
            }

            if !(0.0..=1.0).contains(&self.initial_pos_norm[i]) {
                return Err(ParamsError::InitialPosOutOfRange(i, self.initial_pos_norm[i]));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn valid_params() -> Params {
        Params {
            safe_min: [1.0, 0.0, 1.0, 1.0, 0.0, 0.35],
            safe_max: [0.0, 1.0, 0.0, 0.0, 1.0, 0.9],
            max_speed: [0.35, 0.35, 0.35, 0.35, 2.0, 2.0],
            max_accel: [0.05, 0.05, 0.05, 0.05, 0.2, 0.2],
            initial_pos_norm: [0.5; NUM_SERVOS],
        }
    }

    #[test]
    fn test_valid_params_accepted() {
        assert!(valid_params().are_valid().is_ok());
    }

    #[test]
    fn test_frac_out_of_range_rejected() {
        let mut params = valid_params();
        params.safe_min[2] = 1.2;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::SafeFracOutOfRange(2, _, _))
        ));
    }

    #[test]
    fn test_equal_fracs_rejected() {
        let mut params = valid_params();
        params.safe_min[4] = 0.5;
        params.safe_max[4] = 0.5;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::SafeFracsEqual(4))
        ));
    }

    #[test]
    fn test_non_positive_limits_rejected() {
        let mut params = valid_params();
        params.max_accel[0] = 0.0;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::NonPositiveLimits(0, _, _))
        ));

        let mut params = valid_params();
        params.max_speed[1] = f64::NAN;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::NonPositiveLimits(1, _, _))
        ));
    }

    #[test]
    fn test_initial_pos_out_of_range_rejected() {
        let mut params = valid_params();
        params.initial_pos_norm[5] = -0.1;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::InitialPosOutOfRange(5, _))
        ));
    }
}
