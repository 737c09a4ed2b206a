//! Host platform (linux for example) utility functions

use std::env::VarError;
use std::path::PathBuf;

use uname;

/// Name of the environment variable giving the software root directory.
pub const SW_ROOT_ENV_VAR: &str = "ARM_SW_ROOT";

/// Retrieve uname information.
pub fn get_uname() -> std::io::Result<uname::Info> {
    uname::uname()
}

/// Get the software root directory from the environment.
///
/// The root holds the `params` and `sessions` directories and is pointed at
/// by the `ARM_SW_ROOT` environment variable.
pub fn get_arm_sw_root() -> Result<PathBuf, VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
