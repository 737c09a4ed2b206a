//! Simulated servo driver for non-ARM targets

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use super::{ServoDriver, ServoError, NUM_CHANNELS};
use crate::servo_ctrl::{ABS_MAX_DUTY, ABS_MIN_DUTY};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A servo driver which records the duties it is given instead of touching hardware.
///
/// Performs the same input validation as the real board driver so that development runs off the
/// arm catch bad demands.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimDriver {
    duties: [u16; NUM_CHANNELS as usize],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimDriver {
    /// The last duty set on a channel, or zero if the channel was never set.
    pub fn duty(&self, channel: u8) -> Option<u16> {
        self.duties.get(channel as usize).copied()
    }
}

impl ServoDriver for SimDriver {
    fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), ServoError> {
        if duty < ABS_MIN_DUTY || duty > ABS_MAX_DUTY {
            return Err(ServoError::InvalidDuty(duty));
        }

        if channel >= NUM_CHANNELS {
            return Err(ServoError::InvalidChannel(channel));
        }

        self.duties[channel as usize] = duty;

        trace!("Sim servo driver: channel {} set to duty {}", channel, duty);

        Ok(())
    }
}
