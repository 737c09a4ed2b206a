//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use embedded_hal::blocking::i2c::{Write, WriteRead};
use pwm_pca9685::{Channel, Pca9685};

use super::{ServoDriver, ServoError};
use crate::servo_ctrl::{ABS_MAX_DUTY, ABS_MIN_DUTY};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> ServoDriver for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), ServoError> {
        // If the duty is out of range return an error
        if duty < ABS_MIN_DUTY || duty > ABS_MAX_DUTY {
            return Err(ServoError::InvalidDuty(duty));
        }

        let channel = channel_from_index(channel)?;

        // The on counter is 12 bit, drop the lower 4 bits of the 16 bit duty
        match self.set_channel_on_off(channel, 0, duty >> 4) {
            Ok(_) => Ok(()),
            Err(pwm_pca9685::Error::I2C(_)) => Err(ServoError::I2c),
            Err(pwm_pca9685::Error::InvalidInputData) => Err(ServoError::InvalidDuty(duty)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map a channel index onto the driver's channel type.
fn channel_from_index(index: u8) -> Result<Channel, ServoError> {
    match index {
        0 => Ok(Channel::C0),
        1 => Ok(Channel::C1),
        2 => Ok(Channel::C2),
        3 => Ok(Channel::C3),
        4 => Ok(Channel::C4),
        5 => Ok(Channel::C5),
        6 => Ok(Channel::C6),
        7 => Ok(Channel::C7),
        8 => Ok(Channel::C8),
        9 => Ok(Channel::C9),
        10 => Ok(Channel::C10),
        11 => Ok(Channel::C11),
        12 => Ok(Channel::C12),
        13 => Ok(Channel::C13),
        14 => Ok(Channel::C14),
        15 => Ok(Channel::C15),
        _ => Err(ServoError::InvalidChannel(index)),
    }
}
