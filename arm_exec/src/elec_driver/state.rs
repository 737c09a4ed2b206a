//! # Electronics driver module state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::trace;
#[cfg(target_arch = "arm")]
use pwm_pca9685::Pca9685;
#[cfg(target_arch = "arm")]
use rppal::i2c::I2c;
use thiserror::Error;

// Internal
use super::{Params, ParamsError, ServoDriver, ServoError};
#[cfg(not(target_arch = "arm"))]
use super::SimDriver;
use crate::servo_ctrl::NUM_SERVOS;
use util::{module::State, params, session::Session};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

#[derive(Default)]
pub struct ElecDriver {
    params: Params,
    report: StatusReport,

    /// The driver board, `None` until `init` succeeds.
    #[cfg(target_arch = "arm")]
    board: Option<Pca9685<I2c>>,

    #[cfg(not(target_arch = "arm"))]
    board: Option<SimDriver>,
}

#[derive(Default)]
pub struct InputData {
    /// PWM duty demand for each servo on the 16 bit scale, indexed by
    /// `ServoId::index`.
    pub duty: [u16; NUM_SERVOS],
}

#[derive(Default, Copy, Clone)]
pub struct StatusReport {}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Failed to load parameters: {0}")]
    ParamLoadError(params::LoadError),

    #[error("Loaded parameters are invalid: {0}")]
    ParamsInvalid(ParamsError),

    #[error("Failed to open the I2C bus: {0}")]
    BusInitError(String),

    #[error("Failed to initialise the driver board: {0}")]
    BoardInitError(String),
}

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("The driver board has not been initialised")]
    NotInitialised,

    #[error("Failed to set the duty for servo {0}: {1}")]
    SetDutyError(usize, ServoError),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl State for ElecDriver {
    type InitData = &'static str;
    type InitError = InitError;

    type InputData = InputData;
    type OutputData = ();
    type StatusReport = StatusReport;
    type ProcError = ProcError;

    /// Initialise the electronics driver.
    ///
    /// Expected init data is the path to the module parameters file.
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        // Load parameters
        self.params = match params::load(init_data) {
            Ok(p) => p,
            Err(e) => return Err(InitError::ParamLoadError(e)),
        };

        // Check parameters are valid
        match self.params.are_valid() {
            Ok(_) => (),
            Err(e) => return Err(InitError::ParamsInvalid(e)),
        }

        // The board only exists on the pi, other targets get the sim driver
        #[cfg(target_arch = "arm")]
        {
            let i2c = I2c::with_bus(self.params.i2c_bus)
                .map_err(|e| InitError::BusInitError(format!("{}", e)))?;

            let mut board = Pca9685::new(i2c, self.params.board_addr)
                .map_err(|e| InitError::BoardInitError(format!("{:?}", e)))?;

            // The board starts asleep, the prescale can only be set while it is
            board
                .set_prescale(self.params.pwm_prescale)
                .map_err(|e| InitError::BoardInitError(format!("{:?}", e)))?;
            board
                .enable()
                .map_err(|e| InitError::BoardInitError(format!("{:?}", e)))?;

            self.board = Some(board);
        }

        #[cfg(not(target_arch = "arm"))]
        {
            self.board = Some(SimDriver::default());
        }

        Ok(())
    }

    /// Cyclic processing for the electronics driver.
    ///
    /// Takes the duty demands from ServoCtrl and sends them to the board.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let board = match self.board {
            Some(ref mut b) => b,
            None => return Err(ProcError::NotInitialised),
        };

        for (i, &duty) in input_data.duty.iter().enumerate() {
            board
                .set_duty(self.params.servo_channels[i], duty)
                .map_err(|e| ProcError::SetDutyError(i, e))?;
        }

        trace!("duties out: {:?}", input_data.duty);

        Ok(((), self.report))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(all(test, not(target_arch = "arm")))]
mod test {
    use super::*;

    fn test_driver() -> ElecDriver {
        ElecDriver {
            params: Params {
                i2c_bus: 1,
                board_addr: 0x40,
                pwm_prescale: 121,
                servo_channels: [5, 4, 3, 2, 1, 0],
            },
            report: StatusReport::default(),
            board: Some(SimDriver::default()),
        }
    }

    #[test]
    fn test_proc_sets_mapped_channels() {
        let mut driver = test_driver();

        let input = InputData {
            duty: [1638, 2949, 4915, 6881, 7537, 8192],
        };

        driver.proc(&input).unwrap();

        // Duties land on the channels the params map each servo to
        let board = driver.board.unwrap();
        assert_eq!(board.duty(5), Some(1638));
        assert_eq!(board.duty(4), Some(2949));
        assert_eq!(board.duty(3), Some(4915));
        assert_eq!(board.duty(2), Some(6881));
        assert_eq!(board.duty(1), Some(7537));
        assert_eq!(board.duty(0), Some(8192));
    }

    #[test]
    fn test_proc_without_init_fails() {
        let mut driver = test_driver();
        driver.board = None;

        assert!(matches!(
            driver.proc(&InputData::default()),
            Err(ProcError::NotInitialised)
        ));
    }

    #[test]
    fn test_proc_rejects_out_of_range_duty() {
        let mut driver = test_driver();

        let mut input = InputData {
            duty: [4915; NUM_SERVOS],
        };
        input.duty[2] = 100;

        assert!(matches!(
            driver.proc(&input),
            Err(ProcError::SetDutyError(2, ServoError::InvalidDuty(100)))
        ));
    }
}
