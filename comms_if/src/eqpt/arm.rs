//! # Arm Equipment Commands
//!
//! Demand and telemetry structures exchanged between the arm exec and its
//! clients.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of servo actuators on the arm.
pub const NUM_SERVOS: usize = 6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent from a client to the arm exec.
///
/// Positions are normalised over each servo's safe range, 0.0 to 1.0. The
/// map may be partial: servos not named keep their current target.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ArmDems {
    /// The demanded position of each actuator, normalised to [0, 1].
    pub pos_norm: HashMap<ServoId, f64>,
}

/// Telemetry for a single servo.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ServoTm {
    /// Current normalised position, the last value commanded to hardware.
    pub pos_norm: f64,

    /// Current normalised target position.
    pub target_norm: f64,

    /// Current speed in normalised units per tick. Zero at rest.
    pub speed_norm: f64,

    /// True while a motion profile is still being executed.
    pub moving: bool,
}

/// Telemetry for the whole arm, returned in response to a state request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArmTm {
    /// Time at which this telemetry was sampled.
    pub timestamp: DateTime<Utc>,

    /// Whether the exec is in safe mode.
    pub safe: bool,

    /// Per-servo state.
    pub servos: HashMap<ServoId, ServoTm>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all servo actuators on the arm
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ServoId {
    ShoulderYaw,
    ShoulderPitch,
    Elbow,
    WristPitch,
    WristRoll,
    Grabber,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ServoId {
    /// All servo IDs in parameter-array order.
    pub const ALL: [ServoId; NUM_SERVOS] = [
        ServoId::ShoulderYaw,
        ServoId::ShoulderPitch,
        ServoId::Elbow,
        ServoId::WristPitch,
        ServoId::WristRoll,
        ServoId::Grabber,
    ];

    /// The index of this servo in parameter arrays.
    pub fn index(&self) -> usize {
        match self {
            ServoId::ShoulderYaw => 0,
            ServoId::ShoulderPitch => 1,
            ServoId::Elbow => 2,
            ServoId::WristPitch => 3,
            ServoId::WristRoll => 4,
            ServoId::Grabber => 5,
        }
    }

    /// The snake_case name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServoId::ShoulderYaw => "shoulder_yaw",
            ServoId::ShoulderPitch => "shoulder_pitch",
            ServoId::Elbow => "elbow",
            ServoId::WristPitch => "wrist_pitch",
            ServoId::WristRoll => "wrist_roll",
            ServoId::Grabber => "grabber",
        }
    }
}

impl FromStr for ServoId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shoulder_yaw" => Ok(ServoId::ShoulderYaw),
            "shoulder_pitch" => Ok(ServoId::ShoulderPitch),
            "elbow" => Ok(ServoId::Elbow),
            "wrist_pitch" => Ok(ServoId::WristPitch),
            "wrist_roll" => Ok(ServoId::WristRoll),
            "grabber" => Ok(ServoId::Grabber),
            _ => Err(format!("{:?} is not a recognised servo name", s)),
        }
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ArmDems {
    /// Build a demand set moving a single servo.
    pub fn single(id: ServoId, pos_norm: f64) -> Self {
        let mut dems = Self::default();
        dems.pos_norm.insert(id, pos_norm);
        dems
    }
}

impl ArmTm {
    /// Create an empty telemetry frame stamped with the current time.
    pub fn new(safe: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            safe,
            servos: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dems_json() {
        let json = r#"{"pos_norm": {"WristRoll": 0.8, "Grabber": 0.35}}"#;
        let dems: ArmDems = serde_json::from_str(json).expect("deserialize failed");

        assert_eq!(dems.pos_norm.len(), 2);
        assert_eq!(dems.pos_norm[&ServoId::WristRoll], 0.8);
        assert_eq!(dems.pos_norm[&ServoId::Grabber], 0.35);
    }

    #[test]
    fn test_servo_id_names() {
        for id in ServoId::ALL.iter() {
            assert_eq!(id.as_str().parse::<ServoId>(), Ok(*id));
        }
        assert!("wrist_yaw".parse::<ServoId>().is_err());
    }

    #[test]
    fn test_servo_id_indices_unique() {
        for (i, id) in ServoId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }
}
