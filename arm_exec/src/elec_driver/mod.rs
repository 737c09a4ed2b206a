//! # Electronics driver module
//!
//! Drives the PWM servo board over I2C from the duty demands produced by servo control. The
//! board interface is abstracted behind [`ServoDriver`] so that non-ARM targets, which have no
//! I2C bus, run against a simulated driver instead of the PCA9685.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod pca9685;
#[cfg(not(target_arch = "arm"))]
mod sim;
mod state;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
#[cfg(not(target_arch = "arm"))]
pub use sim::SimDriver;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of PWM channels on the driver board
pub const NUM_CHANNELS: u8 = 16;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {
    /// Set the duty of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The board channel to set, must be below [`NUM_CHANNELS`]
    /// - `duty` - The duty to set on the 16 bit scale. Values outside the absolute servo duty
    ///   range will be rejected.
    fn set_duty(&mut self, channel: u8, duty: u16) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Channel {0} does not exist on the board")]
    InvalidChannel(u8),

    #[error("Duty {0} is outside the absolute servo duty range")]
    InvalidDuty(u16),
}
