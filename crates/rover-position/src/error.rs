//! This module defines the error types used by the `rover-position` crate.

#![warn(missing_docs)]

use rover_kinematics::KinematicsError;

/// Error type for position model operations.
///
/// None of these are fatal to a running simulation: the model reports them
/// and degrades to a stationary robot or a stale estimate for the tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionError {
    /// Error for an unrecognized localization mode name.
    /// This variant is returned when a localization string is neither `"gps"` nor `"odom"`.
    UnknownLocalizationMode(&'static str),
    /// Error for an unrecognized numeric localization mode code.
    UnknownLocalizationCode(u8),
    /// Error for an unrecognized numeric control mode code.
    UnknownControlCode(u8),
    /// Error raised by the kinematics layer.
    Kinematics(KinematicsError),
}

impl core::fmt::Display for PositionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PositionError::UnknownLocalizationMode(msg) => {
                write!(f, "Unknown localization mode: {}", msg)
            }
            PositionError::UnknownLocalizationCode(code) => {
                write!(f, "Unknown localization mode code: {}", code)
            }
            PositionError::UnknownControlCode(code) => {
                write!(f, "Unknown position command mode code: {}", code)
            }
            PositionError::Kinematics(err) => write!(f, "Kinematics error: {}", err),
        }
    }
}

impl core::error::Error for PositionError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            PositionError::Kinematics(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KinematicsError> for PositionError {
    fn from(err: KinematicsError) -> Self {
        PositionError::Kinematics(err)
    }
}
