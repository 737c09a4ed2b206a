//! Smooth servo state machine
//!
//! Wraps a single servo with trajectory planning and duty mapping. Demands are turned into
//! profiles by [`plan`], and [`SmoothServo::tick`] advances the motion by one sample per cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// Internal
use super::{plan, Profile, Sample, ABS_MAX_DUTY, ABS_MIN_DUTY};
use util::maths::{clamp, lin_map};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Static configuration for a single servo.
#[derive(Clone, Copy, Debug)]
pub struct ServoConfig {
    /// Fraction of the absolute duty range output at normalised position 0.
    pub safe_min: f64,

    /// Fraction of the absolute duty range output at normalised position 1.
    ///
    /// May be less than `safe_min` for servos mounted in reverse.
    pub safe_max: f64,

    /// Maximum speed, the travel per cycle is capped at `max_speed * timestep`.
    pub max_speed: f64,

    /// Maximum acceleration, the speed change per cycle is `max_accel * timestep`.
    pub max_accel: f64,

    /// Normalised position the servo assumes at startup.
    pub initial_pos_norm: f64,
}

/// A servo which moves between positions along kinematically limited trajectories.
///
/// Positions are normalised to [0, 1] over the servo's safe range, with the mapping to duty
/// counts fixed at construction. Until [`SmoothServo::start`] is called position demands are
/// ignored, only immediate positioning is possible.
#[derive(Debug)]
pub struct SmoothServo {
    safe_min: f64,
    safe_max: f64,

    /// Duty count at normalised position 0
    duty_zero: f64,

    /// Duty count at normalised position 1
    duty_one: f64,

    max_speed: f64,
    max_accel: f64,

    /// Cycle period in seconds, set by `start`
    timestep_s: Option<f64>,

    pos_norm: f64,
    speed_norm: f64,
    target_norm: f64,

    profile: Profile,
}

/// Summary of a planning pass, returned by [`SmoothServo::set_target`].
#[derive(Clone, Copy, Debug)]
pub struct PlanReport {
    /// Number of samples in the planned profile.
    pub num_samples: usize,

    /// Number of samples dropped because the trajectory exceeded the profile capacity.
    pub num_dropped: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

/// What a call to [`SmoothServo::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickAction {
    /// Followed the next sample of the active profile.
    Follow,

    /// The profile is exhausted and the position was within one acceleration step of the target,
    /// the servo snapped onto the target.
    Settle,

    /// The profile is exhausted but ended further than one acceleration step from the target, the
    /// servo jumped to the target. The payload is the correction applied.
    Jump(f64),

    /// At the target with no profile to follow.
    Idle,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl SmoothServo {
    /// Create a new servo from its configuration.
    ///
    /// Out of range configuration values are limited rather than rejected: duty fractions and the
    /// initial position are clamped into [0, 1].
    pub fn new(config: &ServoConfig) -> Self {
        let abs_range = (f64::from(ABS_MIN_DUTY), f64::from(ABS_MAX_DUTY));

        let safe_min = clamp(&config.safe_min, &0.0, &1.0);
        let safe_max = clamp(&config.safe_max, &0.0, &1.0);
        let initial = clamp(&config.initial_pos_norm, &0.0, &1.0);

        Self {
            safe_min,
            safe_max,
            duty_zero: lin_map((0.0, 1.0), abs_range, safe_min),
            duty_one: lin_map((0.0, 1.0), abs_range, safe_max),
            max_speed: config.max_speed,
            max_accel: config.max_accel,
            timestep_s: None,
            pos_norm: initial,
            speed_norm: 0.0,
            target_norm: initial,
            profile: Profile::new(),
        }
    }

    /// Start the servo, enabling trajectory planning with the given cycle period.
    ///
    /// Fails if the timestep or the kinematic limits are not positive, those would make the
    /// planning arithmetic undefined.
    pub fn start(&mut self, timestep_s: f64) -> Result<(), super::ServoCtrlError> {
        if !timestep_s.is_finite() || timestep_s <= 0.0 {
            return Err(super::ServoCtrlError::InvalidTimestep(timestep_s));
        }

        if !self.max_speed.is_finite()
            || self.max_speed <= 0.0
            || !self.max_accel.is_finite()
            || self.max_accel <= 0.0
        {
            return Err(super::ServoCtrlError::InvalidLimits(
                self.max_speed,
                self.max_accel,
            ));
        }

        self.timestep_s = Some(timestep_s);

        Ok(())
    }

    /// Demand a new target position, replanning the trajectory from the current state.
    ///
    /// The demand is clamped into [0, 1]. Returns `None` if the servo has not been started, in
    /// which case the demand is ignored.
    pub fn set_target(&mut self, target_norm: f64) -> Option<PlanReport> {
        let timestep_s = self.timestep_s?;

        self.target_norm = clamp(&target_norm, &0.0, &1.0);

        self.profile = plan(
            Sample {
                pos_norm: self.pos_norm,
                speed_norm: self.speed_norm,
            },
            self.target_norm,
            self.max_speed,
            self.max_accel,
            timestep_s,
        );

        Some(PlanReport {
            num_samples: self.profile.len(),
            num_dropped: self.profile.num_dropped(),
        })
    }

    /// Advance the servo by one cycle.
    ///
    /// Follows the next profile sample if one is available. When the profile is exhausted the
    /// servo settles onto its exact target: trajectories end near but not on the target, so the
    /// final correction is applied here, and the speed is zeroed. Positions taken from the
    /// profile are clamped into [0, 1] since the planner's braking margin can carry samples
    /// slightly out of range.
    pub fn tick(&mut self) -> TickAction {
        match self.profile.pop() {
            Some(sample) => {
                self.pos_norm = clamp(&sample.pos_norm, &0.0, &1.0);
                self.speed_norm = sample.speed_norm;

                TickAction::Follow
            }
            None => {
                let timestep_s = match self.timestep_s {
                    Some(t) => t,
                    None => return TickAction::Idle,
                };

                let accel_step = self.max_accel * timestep_s;
                let delta = self.target_norm - self.pos_norm;

                if delta.abs() > accel_step {
                    self.pos_norm = self.target_norm;
                    self.speed_norm = 0.0;

                    TickAction::Jump(delta)
                } else if delta != 0.0 {
                    self.pos_norm = self.target_norm;
                    self.speed_norm = 0.0;

                    TickAction::Settle
                } else {
                    self.speed_norm = 0.0;

                    TickAction::Idle
                }
            }
        }
    }

    /// Move the servo to a position immediately, abandoning any active trajectory.
    pub fn set_position_immediate(&mut self, pos_norm: f64) {
        self.pos_norm = clamp(&pos_norm, &0.0, &1.0);
        self.halt();
    }

    /// Stop the servo where it is.
    ///
    /// Any active profile is abandoned and the target is pinned to the current position, so the
    /// servo holds position until a new demand arrives.
    pub fn halt(&mut self) {
        self.profile.clear();
        self.target_norm = self.pos_norm;
        self.speed_norm = 0.0;
    }

    /// The duty count for the servo's current position.
    pub fn duty(&self) -> u16 {
        lin_map((0.0, 1.0), (self.duty_zero, self.duty_one), self.pos_norm).round() as u16
    }

    /// The servo's safe range as `(safe_min, safe_max)` duty fractions.
    pub fn safe_range(&self) -> (f64, f64) {
        (self.safe_min, self.safe_max)
    }

    pub fn pos_norm(&self) -> f64 {
        self.pos_norm
    }

    pub fn target_norm(&self) -> f64 {
        self.target_norm
    }

    /// Current speed in normalised units per cycle. Zero at rest.
    pub fn speed_norm(&self) -> f64 {
        self.speed_norm
    }

    /// True while a trajectory profile is still being followed.
    pub fn is_moving(&self) -> bool {
        !self.profile.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::servo_ctrl::ServoCtrlError;

    const TS: f64 = 0.025;

    fn test_servo(safe_min: f64, safe_max: f64, initial: f64) -> SmoothServo {
        SmoothServo::new(&ServoConfig {
            safe_min,
            safe_max,
            max_speed: 2.0,
            max_accel: 0.2,
            initial_pos_norm: initial,
        })
    }

    #[test]
    fn test_duty_mapping() {
        let mut servo = test_servo(0.2, 0.8, 0.0);
        assert_eq!(servo.duty(), 2949);
        servo.set_position_immediate(1.0);
        assert_eq!(servo.duty(), 6881);

        let mut servo = test_servo(1.0, 0.0, 0.0);
        assert_eq!(servo.duty(), 8192);
        servo.set_position_immediate(1.0);
        assert_eq!(servo.duty(), 1638);

        let mut servo = test_servo(0.0, 1.0, 0.0);
        assert_eq!(servo.duty(), 1638);
        servo.set_position_immediate(0.5);
        assert_eq!(servo.duty(), 4915);
        servo.set_position_immediate(1.0);
        assert_eq!(servo.duty(), 8192);

        let mut servo = test_servo(0.35, 0.9, 0.0);
        assert_eq!(servo.duty(), 3932);
        servo.set_position_immediate(1.0);
        assert_eq!(servo.duty(), 7537);
    }

    #[test]
    fn test_config_clamped() {
        let servo = test_servo(1.4, -0.2, 1.3);

        assert_eq!(servo.safe_range(), (1.0, 0.0));
        assert_eq!(servo.pos_norm(), 1.0);
        assert_eq!(servo.duty(), 1638);
    }

    #[test]
    fn test_follow_then_correct() {
        let mut servo = test_servo(0.2, 0.8, 0.0);
        servo.start(TS).unwrap();

        let report = servo.set_target(0.8).unwrap();
        assert_eq!(report.num_samples, 26);
        assert_eq!(report.num_dropped, 0);
        assert!(servo.is_moving());

        for _ in 0..26 {
            assert_eq!(servo.tick(), TickAction::Follow);
        }

        // The profile overshoots the target, the next tick applies the correction
        assert!(!servo.is_moving());
        assert!((servo.pos_norm() - 0.8375).abs() < 1e-9);

        match servo.tick() {
            TickAction::Jump(delta) => assert!((delta + 0.0375).abs() < 1e-9),
            other => panic!("expected a jump, got {:?}", other),
        }

        assert_eq!(servo.pos_norm(), 0.8);
        assert_eq!(servo.speed_norm(), 0.0);
        assert_eq!(servo.duty(), 6095);

        assert_eq!(servo.tick(), TickAction::Idle);
    }

    #[test]
    fn test_out_of_range_demands_limited() {
        let mut servo = test_servo(0.0, 1.0, 0.5);
        servo.start(TS).unwrap();

        servo.set_target(1.7).unwrap();
        assert_eq!(servo.target_norm(), 1.0);

        // The braking margin carries the profile past 1.0, followed positions must stay in range
        let mut follows = 0;
        while servo.is_moving() {
            assert_eq!(servo.tick(), TickAction::Follow);
            assert!(servo.pos_norm() <= 1.0);
            follows += 1;
        }
        assert_eq!(follows, 20);

        // The last samples were clamped onto the target, so the servo is already settled
        assert_eq!(servo.tick(), TickAction::Idle);
        assert_eq!(servo.pos_norm(), 1.0);

        servo.set_target(-3.0).unwrap();
        assert_eq!(servo.target_norm(), 0.0);

        while servo.is_moving() {
            servo.tick();
            assert!(servo.pos_norm() >= 0.0);
        }

        servo.tick();
        assert_eq!(servo.pos_norm(), 0.0);
        assert_eq!(servo.speed_norm(), 0.0);
    }

    #[test]
    fn test_settle_within_one_step() {
        let mut servo = test_servo(0.0, 1.0, 0.5);
        servo.start(TS).unwrap();

        // A demand within one acceleration step of the position plans no samples at all
        let report = servo.set_target(0.504).unwrap();
        assert_eq!(report.num_samples, 0);

        assert_eq!(servo.tick(), TickAction::Settle);
        assert_eq!(servo.pos_norm(), 0.504);
        assert_eq!(servo.speed_norm(), 0.0);
    }

    #[test]
    fn test_same_target_is_no_op() {
        let mut servo = test_servo(0.0, 1.0, 0.5);
        servo.start(TS).unwrap();

        let report = servo.set_target(0.5).unwrap();
        assert_eq!(report.num_samples, 0);

        assert_eq!(servo.tick(), TickAction::Idle);
        assert_eq!(servo.pos_norm(), 0.5);
        assert_eq!(servo.duty(), 4915);
    }

    #[test]
    fn test_demands_before_start_ignored() {
        let mut servo = test_servo(0.0, 1.0, 0.5);

        assert!(servo.set_target(0.8).is_none());
        assert!(!servo.is_moving());
        assert_eq!(servo.tick(), TickAction::Idle);
        assert_eq!(servo.pos_norm(), 0.5);
        assert_eq!(servo.target_norm(), 0.5);
    }

    #[test]
    fn test_invalid_timestep_rejected() {
        let mut servo = test_servo(0.0, 1.0, 0.5);

        assert!(servo.start(0.0).is_err());
        assert!(servo.start(-1.0).is_err());
        assert!(servo.start(f64::NAN).is_err());
        assert!(servo.start(TS).is_ok());
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let mut servo = SmoothServo::new(&ServoConfig {
            safe_min: 0.0,
            safe_max: 1.0,
            max_speed: 2.0,
            max_accel: 0.0,
            initial_pos_norm: 0.5,
        });

        assert!(matches!(
            servo.start(TS),
            Err(ServoCtrlError::InvalidLimits(_, _))
        ));

        let mut servo = SmoothServo::new(&ServoConfig {
            safe_min: 0.0,
            safe_max: 1.0,
            max_speed: -1.0,
            max_accel: 0.2,
            initial_pos_norm: 0.5,
        });

        assert!(servo.start(TS).is_err());

        // A servo that failed to start still refuses demands
        assert!(servo.set_target(0.8).is_none());
    }

    #[test]
    fn test_halt_holds_position() {
        let mut servo = test_servo(0.0, 1.0, 0.0);
        servo.start(TS).unwrap();
        servo.set_target(0.8).unwrap();

        for _ in 0..5 {
            servo.tick();
        }

        let pos_at_halt = servo.pos_norm();
        assert!(servo.is_moving());

        servo.halt();

        assert!(!servo.is_moving());
        assert_eq!(servo.pos_norm(), pos_at_halt);
        assert_eq!(servo.target_norm(), pos_at_halt);
        assert_eq!(servo.speed_norm(), 0.0);

        // Holding, not settling: further ticks do nothing
        assert_eq!(servo.tick(), TickAction::Idle);
        assert_eq!(servo.pos_norm(), pos_at_halt);
    }

    #[test]
    fn test_retarget_mid_motion_replans() {
        let mut servo = test_servo(0.0, 1.0, 0.0);
        servo.start(TS).unwrap();
        servo.set_target(1.0).unwrap();

        // Run up to full speed
        for _ in 0..10 {
            servo.tick();
        }
        assert!((servo.speed_norm() - 0.05).abs() < 1e-9);

        // Reversing while at full speed brakes before heading back down
        let report = servo.set_target(0.2).unwrap();
        assert!(report.num_samples > 0);

        let mut last_speed = servo.speed_norm();
        for _ in 0..5 {
            servo.tick();
            assert!(servo.speed_norm() < last_speed);
            last_speed = servo.speed_norm();
        }

        // Follow the rest of the profile home, then settle
        while servo.is_moving() {
            servo.tick();
        }
        servo.tick();
        assert_eq!(servo.pos_norm(), 0.2);
        assert_eq!(servo.speed_norm(), 0.0);
    }
}
