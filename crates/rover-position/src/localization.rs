//! Localization modes and the position estimate they maintain.

use core::fmt;
use core::str::FromStr;

use rover_kinematics::{Pose, Velocity};
use tracing::debug;

use crate::PositionError;
use crate::odometry::{IntegrationError, dead_reckon};

/// How the reported pose is derived each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalizationMode {
    /// Perfect localization: the estimate is the true pose expressed in the
    /// origin frame. Configured as `"gps"`.
    #[default]
    Exact,
    /// Odometry: commanded velocities are integrated with a fixed
    /// multiplicative bias, so the estimate drifts. Configured as `"odom"`.
    DeadReckoning,
}

impl LocalizationMode {
    /// The world-file name of this mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            LocalizationMode::Exact => "gps",
            LocalizationMode::DeadReckoning => "odom",
        }
    }
}

impl FromStr for LocalizationMode {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gps" => Ok(LocalizationMode::Exact),
            "odom" => Ok(LocalizationMode::DeadReckoning),
            _ => Err(PositionError::UnknownLocalizationMode(
                "valid choices are \"gps\" and \"odom\"",
            )),
        }
    }
}

impl TryFrom<u8> for LocalizationMode {
    type Error = PositionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LocalizationMode::Exact),
            1 => Ok(LocalizationMode::DeadReckoning),
            other => Err(PositionError::UnknownLocalizationCode(other)),
        }
    }
}

impl fmt::Display for LocalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The localization result reported to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionEstimate {
    /// Global pose of the localization frame. Fixed after configuration.
    pub origin: Pose,
    /// Estimated pose, relative to `origin`.
    pub pose: Pose,
    /// Estimated pose minus the true pose in the origin frame. Zero at
    /// configuration time and under exact localization.
    pub pose_error: Pose,
}

impl PositionEstimate {
    /// An estimate that knows exactly where the robot is relative to `origin`.
    pub fn at_origin(origin: Pose, true_pose: Pose) -> Self {
        PositionEstimate {
            origin,
            pose: true_pose.to_local(&origin),
            pose_error: Pose::default(),
        }
    }

    /// Advance the estimate by one tick.
    ///
    /// Must run after the engine has moved the robot, so `true_pose` already
    /// reflects `velocity` applied for `dt` seconds.
    ///
    /// # Errors
    ///
    /// Propagates integration errors (negative `dt`). The estimate is left
    /// unchanged in that case.
    pub fn update(
        &mut self,
        mode: LocalizationMode,
        true_pose: Pose,
        velocity: Velocity,
        dt: f64,
        error: &IntegrationError,
    ) -> Result<(), PositionError> {
        match mode {
            LocalizationMode::Exact => {
                self.pose = true_pose.to_local(&self.origin);
                self.pose_error = Pose::default();
            }
            LocalizationMode::DeadReckoning => {
                self.pose = dead_reckon(self.pose, velocity, dt, error)?;
                self.pose_error = self.pose.difference(&true_pose.to_local(&self.origin));
            }
        }
        debug!(mode = %mode, pose = %self.pose, "position estimate updated");
        Ok(())
    }
}
