//! Implementations for the ServoCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;
use thiserror::Error;

// Internal
use super::{Params, ParamsError, ServoConfig, ServoCtrlError, SmoothServo, TickAction};
use comms_if::eqpt::arm::{ArmDems, ArmTm, ServoId, ServoTm, NUM_SERVOS};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::{self, Session},
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Servo control module state
#[derive(Default)]
pub struct ServoCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// One servo per `ServoId`, indexed by `ServoId::index`. Empty until `init`.
    servos: Vec<SmoothServo>,

    arch_tm: Archiver,
}

/// Input data to Servo Control.
#[derive(Default)]
pub struct InputData {
    /// The servo demands to be executed, or `None` if there are no new
    /// demands on this cycle.
    pub dems: Option<ArmDems>,
}

/// Output duty demands from ServoCtrl that the electronics driver must execute.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct OutputData {
    /// PWM duty demand for each servo on the 16 bit scale, indexed by
    /// `ServoId::index`.
    pub duty: [u16; NUM_SERVOS],
}

/// Status report for ServoCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// True where a demanded position was outside [0, 1] and had to be limited.
    pub dems_limited: [bool; NUM_SERVOS],

    /// True where a planned trajectory exceeded the profile capacity and was
    /// truncated to its tail.
    pub profile_truncated: [bool; NUM_SERVOS],
}

/// Flat per-servo telemetry record for archiving.
#[derive(Serialize)]
struct TmRecord {
    sim_time_s: f64,
    servo: &'static str,
    pos_norm: f64,
    target_norm: f64,
    speed_norm: f64,
    moving: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMERATIONS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),

    #[error("Failed to start servo {0}: {1}")]
    StartError(usize, ServoCtrlError),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl State for ServoCtrl {
    /// Path to the parameter file and the cycle period in seconds.
    type InitData = (&'static str, f64);
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ServoCtrlError;

    /// Initialise the ServoCtrl module.
    ///
    /// Expected init data is the path to the parameter file and the cycle
    /// period the servos will be ticked at.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let (params_path, timestep_s) = init_data;

        // Load the parameters
        self.params = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e)),
        };

        // Check parameters are valid
        match self.params.are_valid() {
            Ok(_) => (),
            Err(e) => return Err(InitError::ParamsInvalid(e)),
        }

        // Build and start the servos
        self.servos = build_servos(&self.params);

        for (i, servo) in self.servos.iter_mut().enumerate() {
            if let Err(e) = servo.start(timestep_s) {
                return Err(InitError::StartError(i, e));
            }
        }

        // Create the arch folder for servo_ctrl
        let mut arch_path = session.arch_root.clone();
        arch_path.push("servo_ctrl");
        std::fs::create_dir_all(arch_path).unwrap();

        // Initialise the archiver
        self.arch_tm = Archiver::from_path(session, "servo_ctrl/servo_tm.csv").unwrap();

        Ok(())
    }

    /// Perform cyclic processing of Servo Control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        // Check to see if there are new demands
        if let Some(ref dems) = input_data.dems {
            self.apply_dems(dems)?;
        }

        // Advance every servo by one cycle
        for (i, servo) in self.servos.iter_mut().enumerate() {
            if let TickAction::Jump(delta) = servo.tick() {
                warn!(
                    "Servo {} trajectory ended {:.4} from its target, position corrected",
                    ServoId::ALL[i], delta
                );
            }
        }

        // Build the duty outputs
        let mut output = OutputData::default();
        for (i, servo) in self.servos.iter().enumerate() {
            output.duty[i] = servo.duty();
        }

        trace!("ServoCtrl output duties: {:?}", output.duty);

        Ok((output, self.report))
    }
}

impl Archived for ServoCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let sim_time_s = session::get_elapsed_seconds();

        // One flat record per servo
        for (i, servo) in self.servos.iter().enumerate() {
            self.arch_tm.serialise(TmRecord {
                sim_time_s,
                servo: ServoId::ALL[i].as_str(),
                pos_norm: servo.pos_norm(),
                target_norm: servo.target_norm(),
                speed_norm: servo.speed_norm(),
                moving: servo.is_moving(),
            })?;
        }

        Ok(())
    }
}

impl ServoCtrl {
    /// Apply a set of demands to the servos.
    ///
    /// The whole set is validated before any servo is touched, so a demand set
    /// containing a non-finite value moves nothing.
    fn apply_dems(&mut self, dems: &ArmDems) -> Result<(), ServoCtrlError> {
        for (id, pos) in dems.pos_norm.iter() {
            if !pos.is_finite() {
                return Err(ServoCtrlError::NonFiniteDemand(*id, *pos));
            }
        }

        for (id, pos) in dems.pos_norm.iter() {
            let i = id.index();

            if *pos < 0.0 || *pos > 1.0 {
                self.report.dems_limited[i] = true;
            }

            // The servo limits the demand into [0, 1] itself
            if let Some(plan) = self.servos[i].set_target(*pos) {
                trace!("Servo {} planned {} samples", id, plan.num_samples);

                if plan.num_dropped > 0 {
                    self.report.profile_truncated[i] = true;
                    warn!(
                        "Servo {} trajectory truncated, {} samples dropped",
                        id, plan.num_dropped
                    );
                }
            }
        }

        Ok(())
    }

    /// Halt all servos where they are, abandoning any active trajectories.
    ///
    /// The servos hold their current positions until new demands arrive.
    pub fn make_safe(&mut self) {
        for servo in self.servos.iter_mut() {
            servo.halt();
        }
    }

    /// Build the current telemetry frame.
    pub fn telemetry(&self, safe: bool) -> ArmTm {
        let mut tm = ArmTm::new(safe);

        for (i, servo) in self.servos.iter().enumerate() {
            tm.servos.insert(
                ServoId::ALL[i],
                ServoTm {
                    pos_norm: servo.pos_norm(),
                    target_norm: servo.target_norm(),
                    speed_norm: servo.speed_norm(),
                    moving: servo.is_moving(),
                },
            );
        }

        tm
    }
}

/// Build one servo per `ServoId` from the parameters.
fn build_servos(params: &Params) -> Vec<SmoothServo> {
    ServoId::ALL
        .iter()
        .map(|id| {
            let i = id.index();
            SmoothServo::new(&ServoConfig {
                safe_min: params.safe_min[i],
                safe_max: params.safe_max[i],
                max_speed: params.max_speed[i],
                max_accel: params.max_accel[i],
                initial_pos_norm: params.initial_pos_norm[i],
            })
        })
        .collect()
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const TS: f64 = 0.025;

    fn test_params() -> Params {
        Params {
            safe_min: [1.0, 0.0, 1.0, 1.0, 0.0, 0.35],
            safe_max: [0.0, 1.0, 0.0, 0.0, 1.0, 0.9],
            max_speed: [0.35, 0.35, 0.35, 0.35, 2.0, 2.0],
            max_accel: [0.05, 0.05, 0.05, 0.05, 0.2, 0.2],
            initial_pos_norm: [0.5; NUM_SERVOS],
        }
    }

    /// Build a started controller without going through a session, the
    /// archiver stays unbacked and `write` must not be called.
    fn test_ctrl(params: Params) -> ServoCtrl {
        let mut ctrl = ServoCtrl {
            servos: build_servos(&params),
            params,
            ..ServoCtrl::default()
        };

        for servo in ctrl.servos.iter_mut() {
            servo.start(TS).unwrap();
        }

        ctrl
    }

    fn no_dems() -> InputData {
        InputData { dems: None }
    }

    #[test]
    fn test_proc_dems_then_settle() {
        let mut ctrl = test_ctrl(test_params());
        let grabber = ServoId::Grabber.index();

        let input = InputData {
            dems: Some(ArmDems::single(ServoId::Grabber, 0.8)),
        };

        let (output, report) = ctrl.proc(&input).unwrap();

        assert!(!report.dems_limited[grabber]);
        assert!(!report.profile_truncated[grabber]);
        assert!(ctrl.telemetry(false).servos[&ServoId::Grabber].moving);

        // The other servos stay put at their initial duty
        assert_eq!(output.duty[ServoId::WristRoll.index()], 4915);

        // The 0.5 to 0.8 trajectory is 16 samples, run well past it and check
        // the servo settled exactly on target
        for _ in 0..30 {
            ctrl.proc(&no_dems()).unwrap();
        }

        let tm = ctrl.telemetry(false);
        assert!(!tm.servos[&ServoId::Grabber].moving);
        assert_eq!(tm.servos[&ServoId::Grabber].pos_norm, 0.8);
        assert_eq!(tm.servos[&ServoId::Grabber].speed_norm, 0.0);

        let (output, _) = ctrl.proc(&no_dems()).unwrap();
        assert_eq!(output.duty[grabber], 6816);
    }

    #[test]
    fn test_proc_rejects_non_finite_dems() {
        let mut ctrl = test_ctrl(test_params());

        let mut dems = ArmDems::default();
        dems.pos_norm.insert(ServoId::WristRoll, 0.9);
        dems.pos_norm.insert(ServoId::Grabber, f64::NAN);

        let result = ctrl.proc(&InputData { dems: Some(dems) });

        assert!(matches!(
            result,
            Err(ServoCtrlError::NonFiniteDemand(ServoId::Grabber, _))
        ));

        // The valid demand in the same set must not have been applied
        let tm = ctrl.telemetry(false);
        assert!(!tm.servos[&ServoId::WristRoll].moving);
        assert_eq!(tm.servos[&ServoId::WristRoll].target_norm, 0.5);
    }

    #[test]
    fn test_proc_limits_out_of_range_dems() {
        let mut ctrl = test_ctrl(test_params());
        let wrist_roll = ServoId::WristRoll.index();

        let input = InputData {
            dems: Some(ArmDems::single(ServoId::WristRoll, 1.5)),
        };

        let (_, report) = ctrl.proc(&input).unwrap();

        assert!(report.dems_limited[wrist_roll]);
        assert_eq!(ctrl.telemetry(false).servos[&ServoId::WristRoll].target_norm, 1.0);
    }

    #[test]
    fn test_proc_flags_truncated_profiles() {
        // Crawl speed on the shoulder yaw, the 0.5 to 1.0 move plans 397 samples
        let mut params = test_params();
        params.max_speed[ServoId::ShoulderYaw.index()] = 0.05;
        params.max_accel[ServoId::ShoulderYaw.index()] = 0.2;

        let mut ctrl = test_ctrl(params);

        let input = InputData {
            dems: Some(ArmDems::single(ServoId::ShoulderYaw, 1.0)),
        };

        let (_, report) = ctrl.proc(&input).unwrap();

        assert!(report.profile_truncated[ServoId::ShoulderYaw.index()]);
    }

    #[test]
    fn test_make_safe_halts_all() {
        let mut ctrl = test_ctrl(test_params());

        let input = InputData {
            dems: Some(ArmDems::single(ServoId::Grabber, 0.8)),
        };
        ctrl.proc(&input).unwrap();
        ctrl.proc(&no_dems()).unwrap();

        ctrl.make_safe();

        let tm = ctrl.telemetry(true);
        assert!(tm.safe);
        assert!(tm.servos.values().all(|s| !s.moving));

        // Halted servos hold position through further cycles
        let pos_at_halt = tm.servos[&ServoId::Grabber].pos_norm;
        for _ in 0..5 {
            ctrl.proc(&no_dems()).unwrap();
        }
        assert_eq!(ctrl.telemetry(true).servos[&ServoId::Grabber].pos_norm, pos_at_halt);
    }

    #[test]
    fn test_telemetry_covers_all_servos() {
        let ctrl = test_ctrl(test_params());
        let tm = ctrl.telemetry(false);

        assert_eq!(tm.servos.len(), NUM_SERVOS);
        assert!(!tm.safe);
        for id in ServoId::ALL.iter() {
            assert_eq!(tm.servos[id].pos_norm, 0.5);
            assert_eq!(tm.servos[id].target_norm, 0.5);
        }
    }
}
