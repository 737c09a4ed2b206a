//! # Data Store

use log::{info, warn};

use crate::{elec_driver, servo_ctrl};

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Gives the reason the arm has been put into safe mode
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SafeModeCause {
    MakeSafeTc,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time
    pub sim_time_s: f64,

    // Safe mode variables
    /// Determines if the arm is in safe mode.
    pub safe: bool,

    /// Gives the reason for the arm being in safe mode.
    pub safe_cause: Option<SafeModeCause>,

    // ServoCtrl
    pub servo_ctrl: servo_ctrl::ServoCtrl,
    pub servo_ctrl_input: servo_ctrl::InputData,
    pub servo_ctrl_output: servo_ctrl::OutputData,
    pub servo_ctrl_status_rpt: servo_ctrl::StatusReport,

    // ElecDriver
    pub elec_driver: elec_driver::ElecDriver,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Puts the arm into safe mode with the given cause.
    ///
    /// All servos are halted in place and a snapshot of the telemetry at the
    /// time of the halt is saved into the session.
    pub fn make_safe(&mut self, cause: SafeModeCause) {
        if !self.safe {
            warn!("Make safe requested, cause: {:?}", cause);
            self.safe = true;
            self.safe_cause = Some(cause);

            // Make servo_ctrl safe
            self.servo_ctrl.make_safe();

            util::session::save_with_timestamp(
                "safe_mode_tm.json",
                self.servo_ctrl.telemetry(true),
            );
        }
    }

    /// Attempts to disable the safe mode by clearing the given cause.
    ///
    /// Returns `Ok(())` if this cause was cleared and safe mode was disabled, or `Err(())`
    /// otherwise. To remove safe mode the provided cause must match the initial reason for safe
    /// mode being enabled.
    ///
    /// If safe mode was not enabled `Ok(())` is returned
    pub fn make_unsafe(&mut self, cause: SafeModeCause) -> Result<(), ()> {
        if !self.safe {
            return Ok(());
        }

        match self.safe_cause {
            Some(root_cause) => {
                if cause == root_cause {
                    self.safe = false;
                    self.safe_cause = None;
                    info!("Make unsafe requested, root cause match, safe mode disabled");
                    Ok(())
                } else {
                    Err(())
                }
            }
            None => Ok(()),
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        if self.num_cycles % (cycle_frequency_hz as u128) == 0 {
            self.is_1_hz_cycle = true;
        } else {
            self.is_1_hz_cycle = false;
        }

        self.servo_ctrl_input = servo_ctrl::InputData::default();
        self.servo_ctrl_output = servo_ctrl::OutputData::default();
        self.servo_ctrl_status_rpt = servo_ctrl::StatusReport::default();

        self.sim_time_s = util::session::get_elapsed_seconds();
    }
}
