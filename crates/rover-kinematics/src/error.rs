#![warn(missing_docs)]

//! Error types for the kinematics library.
//!
//! This module defines the errors that can occur while parsing drive modes
//! and integrating velocities.

use core::fmt;

/// Errors that can occur in kinematic calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// Error for an unrecognized drive mode name.
    /// This variant is returned when a drive mode string is neither `"diff"` nor `"omni"`.
    UnknownDriveMode(&'static str),
    /// Error for an unrecognized numeric drive mode code.
    UnknownDriveCode(u8),
    /// Error for negative time delta.
    /// This variant is returned when a negative time delta is used for pose updates.
    NegativeTimeDelta(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::UnknownDriveMode(msg) => write!(f, "Unknown drive mode: {}", msg),
            KinematicsError::UnknownDriveCode(code) => write!(f, "Unknown drive mode code: {}", code),
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
