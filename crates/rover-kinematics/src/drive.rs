//! Drivetrain topologies and the velocity constraints they impose.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{KinematicsError, Velocity};

/// The kinematic topology of a mobile base.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveMode {
    /// Speed and turn rate driven by left and right wheels, like a Pioneer.
    /// Lateral motion cannot be expressed.
    #[default]
    Differential,
    /// Forward, lateral and angular axes are controlled independently.
    Omnidirectional,
}

impl DriveMode {
    /// Restrict a requested velocity to what this drivetrain can achieve.
    ///
    /// # Arguments
    ///
    /// * `requested`: The desired forward, lateral and angular velocity.
    ///
    /// # Returns
    ///
    /// The achievable velocity. For [`DriveMode::Differential`] the lateral
    /// component is always exactly zero.
    pub fn apply(self, requested: Velocity) -> Velocity {
        match self {
            DriveMode::Differential => Velocity::new(requested.x, 0.0, requested.a),
            DriveMode::Omnidirectional => requested,
        }
    }

    /// The world-file name of this mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            DriveMode::Differential => "diff",
            DriveMode::Omnidirectional => "omni",
        }
    }
}

impl FromStr for DriveMode {
    type Err = KinematicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diff" => Ok(DriveMode::Differential),
            "omni" => Ok(DriveMode::Omnidirectional),
            _ => Err(KinematicsError::UnknownDriveMode(
                "should be one of \"diff\", \"omni\"",
            )),
        }
    }
}

impl TryFrom<u8> for DriveMode {
    type Error = KinematicsError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DriveMode::Differential),
            1 => Ok(DriveMode::Omnidirectional),
            other => Err(KinematicsError::UnknownDriveCode(other)),
        }
    }
}

impl fmt::Display for DriveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
