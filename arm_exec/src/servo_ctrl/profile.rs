//! Trajectory profile planning
//!
//! A profile is the sequence of per-cycle position samples a servo follows to reach its target.
//! Profiles are planned in full when a new target is set, and consumed one sample per cycle by
//! [`SmoothServo::tick`](super::SmoothServo::tick).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;

use super::MAX_PROFILE_STEPS;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A single sample of a trajectory profile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Normalised position at the end of this cycle.
    pub pos_norm: f64,

    /// Normalised speed over this cycle, in position units per cycle.
    pub speed_norm: f64,
}

/// A bounded queue of trajectory samples.
///
/// Holds at most [`MAX_PROFILE_STEPS`] samples. When a longer trajectory is pushed the oldest
/// samples are evicted, so a servo following a truncated profile will skip the start of the
/// motion. The number of evicted samples is tracked so callers can report the truncation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    samples: VecDeque<Sample>,
    num_dropped: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples remaining in the profile.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples evicted from the front of the profile since it was last cleared.
    pub fn num_dropped(&self) -> u64 {
        self.num_dropped
    }

    /// Append a sample, evicting the oldest sample if the profile is full.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);

        if self.samples.len() > MAX_PROFILE_STEPS {
            self.samples.pop_front();
            self.num_dropped += 1;
        }
    }

    /// Take the next sample to follow.
    pub fn pop(&mut self) -> Option<Sample> {
        self.samples.pop_front()
    }

    /// The final sample of the profile, if any.
    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Remove all samples and reset the dropped counter.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.num_dropped = 0;
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Plan a trajectory from the given state to the target position.
///
/// The returned profile accelerates towards the target at up to `max_accel`, cruises at up to
/// `max_speed`, and brakes so that the final samples approach the target at the lowest resolvable
/// speed. Both limits are scaled by `timestep_s` to give per-cycle steps. If the servo is already
/// moving the plan takes the current speed as its starting condition, braking first if the motion
/// opposes the new target.
///
/// The target is expected to be within the normalised range, callers clamp demands before
/// planning. An empty profile is returned when the servo is already at the target and at rest.
///
/// # Notes
///
/// - Braking distance is estimated with a 10% margin, so trajectories may overshoot the target by
///   a few samples before the loop exits. Followers must correct the final position.
/// - The stopping tick estimate is floored at zero so that a start speed directed away from the
///   target always brakes towards it rather than running away.
pub fn plan(
    start: Sample,
    target_norm: f64,
    max_speed: f64,
    max_accel: f64,
    timestep_s: f64,
) -> Profile {
    let mut profile = Profile::new();

    let delta = target_norm - start.pos_norm;

    // Direction of travel, with the per-cycle limits signed to match
    let dir = 1.0f64.copysign(delta);
    let accel = max_accel.copysign(delta) * timestep_s;
    let max_step = max_speed.copysign(delta) * timestep_s;

    let mut pos = start.pos_norm;
    let mut speed = start.speed_norm;

    // A servo at rest is given half an acceleration step to get the integration going
    if speed == 0.0 {
        speed = accel / 2.0;
    }

    let mut delta_left = target_norm - pos;

    while (delta_left * dir) > (accel * dir) || speed.abs() >= accel.abs() {
        // Estimate the distance needed to brake to a stop from the current speed, with a 10%
        // margin. The tick count is floored at zero so that speed directed away from the target
        // never counts as stopping distance.
        let stop_ticks = (speed / accel).ceil().max(0.0);
        let stop_dist = accel * stop_ticks * stop_ticks * 0.5 * 1.1;

        if (stop_dist * dir) >= (delta_left * dir) {
            speed -= accel;
        } else {
            speed += accel;

            if speed.abs() > max_step.abs() {
                speed = max_step;
            }
        }

        pos += speed;

        profile.push(Sample {
            pos_norm: pos,
            speed_norm: speed,
        });

        delta_left = target_norm - pos;
    }

    profile
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Timestep used by the tests, matching the exec's cycle period.
    const TS: f64 = 0.025;

    fn assert_near(value: f64, expected: f64) {
        assert!(
            (value - expected).abs() < 1e-9,
            "expected {} to be near {}",
            value,
            expected
        );
    }

    #[test]
    fn test_plan_respects_limits() {
        let profile = plan(
            Sample {
                pos_norm: 0.0,
                speed_norm: 0.0,
            },
            0.8,
            2.0,
            0.2,
            TS,
        );

        assert_eq!(profile.len(), 26);
        assert_eq!(profile.num_dropped(), 0);

        let samples: Vec<Sample> = profile.iter().copied().collect();

        // Position advances monotonically towards the target
        for pair in samples.windows(2) {
            assert!(pair[1].pos_norm > pair[0].pos_norm);
        }

        // Speed never exceeds the per-cycle cap, and never changes by more than one acceleration
        // step between samples
        let max_step = 2.0 * TS;
        let accel_step = 0.2 * TS;

        for sample in &samples {
            assert!(sample.speed_norm.abs() <= max_step + 1e-12);
        }
        for pair in samples.windows(2) {
            assert!((pair[1].speed_norm - pair[0].speed_norm).abs() <= accel_step + 1e-12);
        }

        // The braking margin makes the profile overshoot slightly, the follower corrects this
        let last = profile.last().unwrap();
        assert_near(last.pos_norm, 0.8375);
        assert_near(last.speed_norm, accel_step);
    }

    #[test]
    fn test_plan_truncated_to_cap() {
        // A slow full-range sweep needs 797 samples, only the final 200 are kept
        let profile = plan(
            Sample {
                pos_norm: 0.0,
                speed_norm: 0.0,
            },
            1.0,
            0.05,
            0.2,
            TS,
        );

        assert_eq!(profile.len(), MAX_PROFILE_STEPS);
        assert_eq!(profile.num_dropped(), 597);

        // The retained samples are the tail of the motion
        let first = profile.iter().next().unwrap();
        assert_near(first.pos_norm, 0.7475);
        assert_near(profile.last().unwrap().pos_norm, 0.99625);
    }

    #[test]
    fn test_plan_reversal_brakes_first() {
        // Moving at full speed towards 1.0 when the target drops below the current position
        let profile = plan(
            Sample {
                pos_norm: 0.5,
                speed_norm: 0.05,
            },
            0.2,
            2.0,
            0.2,
            TS,
        );

        assert_eq!(profile.len(), 31);

        let samples: Vec<Sample> = profile.iter().copied().collect();

        // Braking starts on the very first sample
        assert_near(samples[0].speed_norm, 0.045);

        // The servo coasts up to 0.725 while shedding speed, then comes back down
        let max_pos = samples.iter().map(|s| s.pos_norm).fold(0.0, f64::max);
        assert_near(max_pos, 0.725);
        assert_near(samples[9].speed_norm, 0.0);
        assert_near(profile.last().unwrap().pos_norm, 0.16);
    }

    #[test]
    fn test_plan_stop_demand_brakes() {
        // Demanding the current position while moving plans a braking run which ends where the
        // servo can stop, not where it started
        let profile = plan(
            Sample {
                pos_norm: 0.5,
                speed_norm: 0.05,
            },
            0.5,
            2.0,
            0.2,
            TS,
        );

        assert_eq!(profile.len(), 9);

        let samples: Vec<Sample> = profile.iter().copied().collect();
        for pair in samples.windows(2) {
            assert!(pair[1].speed_norm < pair[0].speed_norm);
        }

        assert_near(samples[0].speed_norm, 0.045);
        assert_near(profile.last().unwrap().pos_norm, 0.725);
    }

    #[test]
    fn test_plan_opposing_speed_terminates() {
        // Start speed directed away from a nearby target. Without the stopping tick floor the
        // braking estimate treats the opposing speed as stopping distance and the loop runs away.
        let profile = plan(
            Sample {
                pos_norm: 0.5,
                speed_norm: -0.05,
            },
            0.51,
            2.0,
            0.2,
            TS,
        );

        assert_eq!(profile.len(), 24);

        let min_pos = profile.iter().map(|s| s.pos_norm).fold(1.0, f64::min);
        assert_near(min_pos, 0.275);
        assert_near(profile.last().unwrap().pos_norm, 0.51);

        for sample in profile.iter() {
            assert!(sample.speed_norm.abs() <= 2.0 * TS + 1e-12);
        }
    }

    #[test]
    fn test_plan_at_target_is_empty() {
        let profile = plan(
            Sample {
                pos_norm: 0.5,
                speed_norm: 0.0,
            },
            0.5,
            2.0,
            0.2,
            TS,
        );

        assert!(profile.is_empty());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let start = Sample {
            pos_norm: 0.3,
            speed_norm: 0.0,
        };

        assert_eq!(
            plan(start, 0.9, 2.0, 0.2, TS),
            plan(start, 0.9, 2.0, 0.2, TS)
        );
    }

    #[test]
    fn test_profile_evicts_oldest() {
        let mut profile = Profile::new();

        for i in 0..(MAX_PROFILE_STEPS + 3) {
            profile.push(Sample {
                pos_norm: i as f64,
                speed_norm: 0.0,
            });
        }

        assert_eq!(profile.len(), MAX_PROFILE_STEPS);
        assert_eq!(profile.num_dropped(), 3);
        assert_eq!(profile.pop().unwrap().pos_norm, 3.0);

        profile.clear();
        assert!(profile.is_empty());
        assert_eq!(profile.num_dropped(), 0);
    }
}
