//! # Arm library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable
pub mod data_store;

/// Demands server - accepts telecommands from remote clients
pub mod dems_server;

/// Electronics driver - pushes duty cycles out to the servo driver board
pub mod elec_driver;

/// Parameters for the arm executable
pub mod params;

/// Servo control module - plans and follows kinematically limited trajectories for each servo
pub mod servo_ctrl;
