//! Command interpretation: velocity passthrough or closed-loop position control.
//!
//! The controller holds no state between ticks. Every tick it reads the
//! stored [`Command`] and the current position estimate and produces the
//! velocity to actuate, already restricted to what the drivetrain can do.

use core::f64::consts::PI;

use rover_kinematics::{DriveMode, Pose, Velocity, normalize_angle};
use serde::Deserialize;
use tracing::debug;

use crate::PositionError;

/// Distance below which the position controller stops translating and only
/// turns to the commanded heading (m).
pub const CLOSE_ENOUGH: f64 = 0.02;

/// Heading error below which a differential base drives toward the goal
/// point instead of turning in place (rad).
pub const HEADING_TOLERANCE: f64 = PI / 16.0;

/// How the `x`, `y`, `a` fields of a [`Command`] are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// The command is a body-frame velocity.
    #[default]
    VelocityControl,
    /// The command is a target pose in the estimated localization frame.
    PositionControl,
}

impl TryFrom<u8> for ControlMode {
    type Error = PositionError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ControlMode::VelocityControl),
            1 => Ok(ControlMode::PositionControl),
            other => Err(PositionError::UnknownControlCode(other)),
        }
    }
}

/// The desired control input written by clients between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Command {
    /// Interpretation of the remaining fields.
    pub mode: ControlMode,
    /// Forward velocity, or target x.
    pub x: f64,
    /// Lateral velocity, or target y.
    pub y: f64,
    /// Angular velocity, or target heading.
    pub a: f64,
}

impl Command {
    /// A velocity command of zero on every axis.
    pub const STOP: Command = Command {
        mode: ControlMode::VelocityControl,
        x: 0.0,
        y: 0.0,
        a: 0.0,
    };

    /// Request a body-frame velocity.
    pub const fn velocity(x: f64, y: f64, a: f64) -> Self {
        Command { mode: ControlMode::VelocityControl, x, y, a }
    }

    /// Request a target pose in the estimated localization frame.
    pub const fn position(x: f64, y: f64, a: f64) -> Self {
        Command { mode: ControlMode::PositionControl, x, y, a }
    }

    /// Build a command from an untyped mode code, as received from a client.
    ///
    /// # Errors
    ///
    /// Returns `Err(PositionError::UnknownControlCode)` if `code` is not a known mode.
    pub fn from_raw(code: u8, x: f64, y: f64, a: f64) -> Result<Self, PositionError> {
        Ok(Command { mode: ControlMode::try_from(code)?, x, y, a })
    }
}

/// Speed limits applied by the position controller.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 3]")]
pub struct SpeedLimits {
    /// Maximum forward speed (m/s).
    pub x: f64,
    /// Maximum lateral speed (m/s).
    pub y: f64,
    /// Maximum turn rate (rad/s).
    pub a: f64,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        SpeedLimits { x: 0.4, y: 0.4, a: 1.0 }
    }
}

impl From<[f64; 3]> for SpeedLimits {
    fn from([x, y, a]: [f64; 3]) -> Self {
        SpeedLimits { x, y, a }
    }
}

impl SpeedLimits {
    /// Whether every limit is a finite, non-negative number.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.a]
            .iter()
            .all(|limit| limit.is_finite() && *limit >= 0.0)
    }
}

/// Magnitude of a limit. A NaN limit allows no motion on that axis.
fn magnitude(limit: f64) -> f64 {
    if limit.is_nan() { 0.0 } else { limit.abs() }
}

/// Clamp `value` into `[-|limit|, |limit|]` without panicking on bad limits.
fn saturate(value: f64, limit: f64) -> f64 {
    let limit = magnitude(limit);
    value.clamp(-limit, limit)
}

/// Compute the velocity to actuate this tick.
///
/// # Arguments
///
/// * `command`: The stored command.
/// * `drive`: The drivetrain the velocity must be achievable on.
/// * `estimate`: The current estimated pose, used as feedback under position control.
/// * `limits`: Speed limits for position control.
///
/// # Returns
///
/// The commanded velocity after drive-mode constraints. Under differential
/// drive the lateral component is always zero.
pub fn command_velocity(
    command: &Command,
    drive: DriveMode,
    estimate: &Pose,
    limits: &SpeedLimits,
) -> Velocity {
    let requested = match command.mode {
        ControlMode::VelocityControl => Velocity::new(command.x, command.y, command.a),
        ControlMode::PositionControl => position_control(command, drive, estimate, limits),
    };
    drive.apply(requested)
}

fn position_control(command: &Command, drive: DriveMode, estimate: &Pose, limits: &SpeedLimits) -> Velocity {
    let x_error = command.x - estimate.x;
    let y_error = command.y - estimate.y;
    let a_error = normalize_angle(command.a - estimate.a);
    debug!(x_error, y_error, a_error, "position control errors");

    match drive {
        // Each axis is reduced independently by a saturated proportional controller.
        DriveMode::Omnidirectional => Velocity::new(
            saturate(x_error, limits.x),
            saturate(y_error, limits.y),
            saturate(a_error, limits.a),
        ),
        // Turn to face the goal point, drive there, then turn to the goal heading.
        DriveMode::Differential => {
            if x_error.abs() < CLOSE_ENOUGH && y_error.abs() < CLOSE_ENOUGH {
                debug!("turning on the spot");
                return Velocity::new(0.0, 0.0, saturate(a_error, limits.a));
            }

            let goal_angle = y_error.atan2(x_error);
            let goal_distance = y_error.hypot(x_error);
            let heading_error = normalize_angle(goal_angle - estimate.a);
            let turn = saturate(heading_error, limits.a);
            debug!(heading_error, goal_distance, "steering toward goal point");

            if heading_error.abs() < HEADING_TOLERANCE {
                Velocity::new(goal_distance.min(magnitude(limits.x)), 0.0, turn)
            } else {
                Velocity::new(0.0, 0.0, turn)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn limits() -> SpeedLimits {
        SpeedLimits::default()
    }

    #[test]
    fn test_velocity_control_passthrough() {
        let cmd = Command::velocity(0.3, 0.2, -0.5);
        let omni = command_velocity(&cmd, DriveMode::Omnidirectional, &Pose::default(), &limits());
        assert_eq!(omni, Velocity::new(0.3, 0.2, -0.5));

        let diff = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits());
        assert_eq!(diff, Velocity::new(0.3, 0.0, -0.5));
    }

    #[test]
    fn test_velocity_control_is_not_limited() {
        let cmd = Command::velocity(5.0, 0.0, 3.0);
        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits());
        assert_eq!(v, Velocity::new(5.0, 0.0, 3.0));
    }

    #[test]
    fn test_omni_position_control_saturates() {
        let cmd = Command::position(1.0, 0.0, 0.0);
        let v = command_velocity(&cmd, DriveMode::Omnidirectional, &Pose::default(), &limits());
        assert!((v.x - 0.4).abs() < EPSILON);
        assert!(v.y.abs() < EPSILON);
        assert!(v.a.abs() < EPSILON);
    }

    #[test]
    fn test_omni_position_control_clamps_negative_errors() {
        let cmd = Command::position(-2.0, -0.1, -3.0);
        let v = command_velocity(&cmd, DriveMode::Omnidirectional, &Pose::default(), &limits());
        assert!((v.x - -0.4).abs() < EPSILON);
        assert!((v.y - -0.1).abs() < EPSILON);
        assert!((v.a - -1.0).abs() < EPSILON);
    }

    #[test]
    fn test_omni_position_control_heading_wraps() {
        // 3.0 - (-3.0) wraps to a small negative error, not a large positive one.
        let cmd = Command::position(0.0, 0.0, 3.0);
        let v = command_velocity(&cmd, DriveMode::Omnidirectional, &Pose::new(0.0, 0.0, -3.0), &limits());
        assert!((v.a - (6.0 - 2.0 * PI)).abs() < EPSILON);
    }

    #[test]
    fn test_diff_turns_on_the_spot_when_close() {
        let cmd = Command::position(0.0, 0.0, PI / 2.0);
        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits());
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 0.0);
        assert!((v.a - 1.0).abs() < EPSILON);

        let cmd = Command::position(0.01, -0.01, -0.3);
        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits());
        assert_eq!(v.x, 0.0);
        assert!((v.a - -0.3).abs() < EPSILON);
    }

    #[test]
    fn test_diff_rotates_before_driving() {
        let cmd = Command::position(1.0, 1.0, 0.0);
        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits());
        assert_eq!(v.x, 0.0);
        assert_eq!(v.y, 0.0);
        assert!((v.a - PI / 4.0).abs() < EPSILON);
    }

    #[test]
    fn test_diff_drives_once_aligned() {
        let cmd = Command::position(1.0, 1.0, 0.0);
        // Heading error just inside the tolerance.
        let estimate = Pose::new(0.0, 0.0, PI / 4.0 - HEADING_TOLERANCE * 0.5);
        let v = command_velocity(&cmd, DriveMode::Differential, &estimate, &limits());
        assert!((v.x - 0.4).abs() < EPSILON);
        assert_eq!(v.y, 0.0);
        assert!((v.a - HEADING_TOLERANCE * 0.5).abs() < EPSILON);

        // ...and just outside it.
        let estimate = Pose::new(0.0, 0.0, PI / 4.0 - HEADING_TOLERANCE * 1.5);
        let v = command_velocity(&cmd, DriveMode::Differential, &estimate, &limits());
        assert_eq!(v.x, 0.0);
    }

    #[test]
    fn test_diff_slows_near_goal() {
        let cmd = Command::position(0.1, 0.0, 0.0);
        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits());
        assert!((v.x - 0.1).abs() < EPSILON);
        assert!(v.a.abs() < EPSILON);
    }

    #[test]
    fn test_diff_goal_behind_turns_in_place() {
        let cmd = Command::position(-1.0, 0.0, 0.0);
        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits());
        assert_eq!(v.x, 0.0);
        assert!((v.a.abs() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_diff_position_control_never_moves_laterally() {
        let targets = [(1.0, 1.0), (0.0, 5.0), (-3.0, -0.2), (0.001, 0.5)];
        for (x, y) in targets {
            let cmd = Command::position(x, y, 1.0);
            let v = command_velocity(&cmd, DriveMode::Differential, &Pose::new(0.2, 0.1, 0.4), &limits());
            assert_eq!(v.y, 0.0);
        }
    }

    #[test]
    fn test_custom_speed_limits() {
        let limits = SpeedLimits::from([0.1, 0.2, 0.5]);
        let cmd = Command::position(3.0, -3.0, 3.0);
        let v = command_velocity(&cmd, DriveMode::Omnidirectional, &Pose::default(), &limits);
        assert_eq!(v, Velocity::new(0.1, -0.2, 0.5));
    }

    #[test]
    fn test_negative_speed_limit_uses_magnitude() {
        let limits = SpeedLimits::from([-0.4, 0.4, 1.0]);
        assert!(!limits.is_valid());
        let cmd = Command::position(1.0, 0.0, 0.0);
        let v = command_velocity(&cmd, DriveMode::Omnidirectional, &Pose::default(), &limits);
        assert!((v.x - 0.4).abs() < EPSILON);

        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits);
        assert!((v.x - 0.4).abs() < EPSILON);
    }

    #[test]
    fn test_nan_speed_limit_stops_that_axis() {
        let limits = SpeedLimits::from([f64::NAN, 0.4, f64::NAN]);
        assert!(!limits.is_valid());
        let cmd = Command::position(1.0, -1.0, 1.0);
        let v = command_velocity(&cmd, DriveMode::Omnidirectional, &Pose::default(), &limits);
        assert_eq!(v, Velocity::new(0.0, -0.4, 0.0));

        let cmd = Command::position(0.0, 0.0, 1.0);
        let v = command_velocity(&cmd, DriveMode::Differential, &Pose::default(), &limits);
        assert_eq!(v, Velocity::ZERO);
    }

    #[test]
    fn test_command_from_raw() {
        assert_eq!(Command::from_raw(0, 1.0, 2.0, 3.0), Ok(Command::velocity(1.0, 2.0, 3.0)));
        assert_eq!(Command::from_raw(1, 1.0, 2.0, 3.0), Ok(Command::position(1.0, 2.0, 3.0)));
        assert_eq!(
            Command::from_raw(7, 1.0, 2.0, 3.0),
            Err(PositionError::UnknownControlCode(7))
        );
        assert_eq!(Command::default(), Command::STOP);
    }
}
