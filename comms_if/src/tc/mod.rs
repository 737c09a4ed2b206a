//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface.
//!
//! Telecommands are JSON envelopes of the form
//! `{"type": "<TYPE>", "payload": <JSON>}`, where the payload is only
//! required for types which carry data.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, json, Value};
use thiserror::Error;

// Internal
use crate::eqpt::arm::{ArmDems, ArmTm};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to the arm exec by a client.
#[derive(Debug, Clone)]
pub enum ArmTc {
    /// Demand new target positions for one or more servos.
    Dems(ArmDems),

    /// Request the current arm telemetry.
    GetState,

    /// Put the exec into safe mode, halting all motion.
    MakeSafe,

    /// Leave safe mode.
    MakeUnsafe,

    /// Connectivity check.
    Ping,
}

/// Response to a telecommand.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ArmTcResponse {
    /// The TC was accepted and executed.
    Ok,

    /// The TC cannot be executed because the exec is in safe mode.
    CannotExecute,

    /// The TC could not be parsed or contained invalid data.
    Invalid(String),

    /// Arm telemetry, in response to a `GetState` TC.
    State(ArmTm),

    /// Reply to a `Ping` TC.
    Pong,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0} is expected to have a payload but it doesn't")]
    MissingPayload(String),

    #[error("TC of type {0} has an invalid payload: {1}")]
    InvalidPayload(String, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmTc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = match serde_json::from_str(json_str) {
            Ok(v) => v,
            Err(e) => return Err(TcParseError::InvalidJson(e)),
        };

        // Get the type of the TC
        let tc_type = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };

        match tc_type {
            "DEMS" => {
                // Demands must carry a payload
                if val["payload"].is_null() {
                    return Err(TcParseError::MissingPayload(tc_type.into()));
                }

                let dems: ArmDems = match serde_json::from_value(val["payload"].clone()) {
                    Ok(d) => d,
                    Err(e) => return Err(TcParseError::InvalidPayload(tc_type.into(), e)),
                };

                Ok(ArmTc::Dems(dems))
            }
            "STATE" => Ok(ArmTc::GetState),
            "SAFE" => Ok(ArmTc::MakeSafe),
            "UNSAFE" => Ok(ArmTc::MakeUnsafe),
            "PING" => Ok(ArmTc::Ping),
            _ => Err(TcParseError::InvalidType(format!(
                "{} is not a recognised TC type",
                tc_type
            ))),
        }
    }

    /// Serialise the TC into its JSON envelope.
    pub fn to_json(&self) -> String {
        let val = match self {
            ArmTc::Dems(dems) => json!({
                "type": "DEMS",
                "payload": dems
            }),
            ArmTc::GetState => json!({"type": "STATE"}),
            ArmTc::MakeSafe => json!({"type": "SAFE"}),
            ArmTc::MakeUnsafe => json!({"type": "UNSAFE"}),
            ArmTc::Ping => json!({"type": "PING"}),
        };

        val.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::eqpt::arm::ServoId;

    #[test]
    fn test_parse_dems() {
        let tc = ArmTc::from_json(
            r#"{"type": "DEMS", "payload": {"pos_norm": {"Elbow": 0.25}}}"#,
        )
        .expect("parse failed");

        match tc {
            ArmTc::Dems(d) => assert_eq!(d.pos_norm[&ServoId::Elbow], 0.25),
            other => panic!("expected Dems, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_no_payload_types() {
        assert!(matches!(
            ArmTc::from_json(r#"{"type": "STATE"}"#),
            Ok(ArmTc::GetState)
        ));
        assert!(matches!(
            ArmTc::from_json(r#"{"type": "SAFE"}"#),
            Ok(ArmTc::MakeSafe)
        ));
        assert!(matches!(
            ArmTc::from_json(r#"{"type": "UNSAFE"}"#),
            Ok(ArmTc::MakeUnsafe)
        ));
        assert!(matches!(
            ArmTc::from_json(r#"{"type": "PING"}"#),
            Ok(ArmTc::Ping)
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ArmTc::from_json("not json at all"),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            ArmTc::from_json(r#"{"type": "WARP_DRIVE"}"#),
            Err(TcParseError::InvalidType(_))
        ));
        assert!(matches!(
            ArmTc::from_json(r#"{"type": "DEMS"}"#),
            Err(TcParseError::MissingPayload(_))
        ));
        assert!(matches!(
            ArmTc::from_json(r#"{"type": "DEMS", "payload": {"pos_norm": 3}}"#),
            Err(TcParseError::InvalidPayload(_, _))
        ));
    }

    #[test]
    fn test_envelope_round_trip() {
        let tc = ArmTc::Dems(ArmDems::single(ServoId::Grabber, 0.9));
        let json = tc.to_json();

        match ArmTc::from_json(&json).expect("re-parse failed") {
            ArmTc::Dems(d) => assert_eq!(d.pos_norm[&ServoId::Grabber], 0.9),
            other => panic!("expected Dems, got {:?}", other),
        }
    }
}
