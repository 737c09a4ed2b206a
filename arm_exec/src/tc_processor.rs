//! # Telecommand processor module
//!
//! The telecommand processor handles various TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;

// Internal
use arm_lib::data_store::{DataStore, SafeModeCause};
use comms_if::tc::{ArmTc, ArmTcResponse};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules, and produces the response to
/// return to the TC's sender. Motion demands are rejected while the arm is in safe mode, state
/// requests and safe mode changes are always allowed.
pub(crate) fn exec(ds: &mut DataStore, tc: &ArmTc) -> ArmTcResponse {
    // Handle different TCs
    match tc {
        ArmTc::Dems(dems) => {
            if ds.safe {
                return ArmTcResponse::CannotExecute;
            }

            ds.servo_ctrl_input.dems = Some(dems.clone());
            ArmTcResponse::Ok
        }
        ArmTc::GetState => ArmTcResponse::State(ds.servo_ctrl.telemetry(ds.safe)),
        ArmTc::MakeSafe => {
            debug!("Recieved MakeSafe command");
            ds.make_safe(SafeModeCause::MakeSafeTc);
            ArmTcResponse::Ok
        }
        ArmTc::MakeUnsafe => {
            debug!("Recieved MakeUnsafe command");
            match ds.make_unsafe(SafeModeCause::MakeSafeTc) {
                Ok(_) => ArmTcResponse::Ok,
                Err(_) => ArmTcResponse::CannotExecute,
            }
        }
        ArmTc::Ping => ArmTcResponse::Pong,
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::arm::{ArmDems, ServoId};

    #[test]
    fn test_ping() {
        let mut ds = DataStore::default();

        assert!(matches!(exec(&mut ds, &ArmTc::Ping), ArmTcResponse::Pong));
    }

    #[test]
    fn test_dems_accepted_when_unsafe() {
        let mut ds = DataStore::default();

        let tc = ArmTc::Dems(ArmDems::single(ServoId::Grabber, 0.8));

        assert!(matches!(exec(&mut ds, &tc), ArmTcResponse::Ok));
        assert!(ds.servo_ctrl_input.dems.is_some());
    }

    #[test]
    fn test_safe_mode_blocks_dems() {
        let mut ds = DataStore::default();

        assert!(matches!(exec(&mut ds, &ArmTc::MakeSafe), ArmTcResponse::Ok));
        assert!(ds.safe);

        // Motion demands must be rejected and not reach servo control
        let tc = ArmTc::Dems(ArmDems::single(ServoId::Grabber, 0.8));
        assert!(matches!(exec(&mut ds, &tc), ArmTcResponse::CannotExecute));
        assert!(ds.servo_ctrl_input.dems.is_none());

        // State requests and pings still work
        match exec(&mut ds, &ArmTc::GetState) {
            ArmTcResponse::State(tm) => assert!(tm.safe),
            other => panic!("expected state response, got {:?}", other),
        }
        assert!(matches!(exec(&mut ds, &ArmTc::Ping), ArmTcResponse::Pong));

        // Leaving safe mode allows demands again
        assert!(matches!(exec(&mut ds, &ArmTc::MakeUnsafe), ArmTcResponse::Ok));
        assert!(!ds.safe);
        assert!(matches!(exec(&mut ds, &tc), ArmTcResponse::Ok));
    }
}
