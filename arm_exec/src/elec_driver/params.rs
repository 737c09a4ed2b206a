//! # Electronics driver parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use serde::Deserialize;
use thiserror::Error;

// Internal
use super::NUM_CHANNELS;
use crate::servo_ctrl::NUM_SERVOS;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

#[derive(Clone, Deserialize, Default)]
pub struct Params {
    /// The I2C bus the driver board is connected to
    pub i2c_bus: u8,

    /// The 7 bit I2C address of the driver board
    pub board_addr: u8,

    /// Prescale value setting the board's PWM frequency.
    ///
    /// The board clock is 25 MHz, the output frequency is
    /// 25e6 / (4096 * (prescale + 1)), so 121 gives the 50 Hz servos expect.
    pub pwm_prescale: u8,

    /// Map between `ServoId::index` and board channels.
    pub servo_channels: [u8; NUM_SERVOS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("I2C address {0:#04x} is not a valid 7 bit address")]
    InvalidBoardAddr(u8),

    #[error("Prescale {0} is below the board's minimum of 3")]
    PrescaleTooLow(u8),

    #[error("Servo {0} is mapped to channel {1} which does not exist on the board")]
    ChannelOutOfRange(usize, u8),

    #[error("Not all servos have unique channels")]
    NonUniqueChannels,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Params {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if self.board_addr > 0x7F {
            return Err(ParamsError::InvalidBoardAddr(self.board_addr));
        }

        // Prescales below 3 are rejected by the board itself
        if self.pwm_prescale < 3 {
            return Err(ParamsError::PrescaleTooLow(self.pwm_prescale));
        }

        for i in 0..NUM_SERVOS {
            if self.servo_channels[i] >= NUM_CHANNELS {
                return Err(ParamsError::ChannelOutOfRange(i, self.servo_channels[i]));
            }
        }

        // Non unique channels
        let mut non_unique = false;

        for i in 0..self.servo_channels.len() {
            if self
                .servo_channels
                .iter()
                .filter(|&c| *c == self.servo_channels[i])
                .count()
                > 1
            {
                non_unique = true;
            }
        }

        if non_unique {
            return Err(ParamsError::NonUniqueChannels);
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn valid_params() -> Params {
        Params {
            i2c_bus: 1,
            board_addr: 0x40,
            pwm_prescale: 121,
            servo_channels: [0, 1, 2, 3, 4, 5],
        }
    }

    #[test]
    fn test_valid_params_accepted() {
        assert!(valid_params().are_valid().is_ok());
    }

    #[test]
    fn test_invalid_addr_rejected() {
        let mut params = valid_params();
        params.board_addr = 0x80;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::InvalidBoardAddr(0x80))
        ));
    }

    #[test]
    fn test_low_prescale_rejected() {
        let mut params = valid_params();
        params.pwm_prescale = 2;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::PrescaleTooLow(2))
        ));
    }

    #[test]
    fn test_channel_out_of_range_rejected() {
        let mut params = valid_params();
        params.servo_channels[3] = 16;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::ChannelOutOfRange(3, 16))
        ));
    }

    #[test]
    fn test_duplicate_channels_rejected() {
        let mut params = valid_params();
        params.servo_channels[5] = 0;

        assert!(matches!(
            params.are_valid(),
            Err(ParamsError::NonUniqueChannels)
        ));
    }
}
