//! Odometric integration with a persistent systematic error.
//!
//! Each position model draws a multiplicative bias per axis once, when it is
//! created, and applies it to every velocity it integrates afterwards. The
//! estimate therefore drifts away from ground truth the further the robot
//! travels, the way wheel odometry does on a real base.

use rand::Rng;
use rover_kinematics::{KinematicsError, Pose, Velocity, normalize_angle};
use serde::Deserialize;

use crate::PositionError;

/// Upper bounds on the proportional integration error of each axis.
///
/// For a bound `E`, the actual error is drawn uniformly from `[-E/2, +E/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 3]")]
pub struct ErrorBounds {
    /// Maximum proportional error of the forward axis.
    pub x: f64,
    /// Maximum proportional error of the lateral axis.
    pub y: f64,
    /// Maximum proportional error of the angular axis.
    pub a: f64,
}

impl ErrorBounds {
    /// Bounds that produce an error-free integrator.
    pub const NONE: ErrorBounds = ErrorBounds { x: 0.0, y: 0.0, a: 0.0 };

    /// Construct new error bounds.
    pub const fn new(x: f64, y: f64, a: f64) -> Self {
        ErrorBounds { x, y, a }
    }
}

impl Default for ErrorBounds {
    fn default() -> Self {
        ErrorBounds { x: 0.03, y: 0.03, a: 0.05 }
    }
}

impl From<[f64; 3]> for ErrorBounds {
    fn from([x, y, a]: [f64; 3]) -> Self {
        ErrorBounds { x, y, a }
    }
}

/// The multiplicative bias applied to each integrated axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntegrationError {
    /// Proportional error of the forward axis.
    pub x: f64,
    /// Proportional error of the lateral axis.
    pub y: f64,
    /// Proportional error of the angular axis.
    pub a: f64,
}

impl IntegrationError {
    /// Draw an error for each axis uniformly from `[-E/2, +E/2)`.
    ///
    /// A zero bound yields exactly zero error on that axis.
    pub fn sample<R: Rng + ?Sized>(bounds: &ErrorBounds, rng: &mut R) -> Self {
        let mut draw = |max: f64| rng.random::<f64>() * max - max / 2.0;
        IntegrationError {
            x: draw(bounds.x),
            y: draw(bounds.y),
            a: draw(bounds.a),
        }
    }

    /// Returns true if this error leaves every axis unscaled.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.a == 0.0
    }
}

/// Integrate a body-frame velocity over `dt` seconds onto an odometric pose.
///
/// The heading is advanced first and the updated heading rotates the
/// translation increment. Every axis is scaled by `1 + error`.
///
/// # Errors
///
/// Returns `Err(PositionError::Kinematics(KinematicsError::NegativeTimeDelta))` if `dt` is negative.
pub fn dead_reckon(
    pose: Pose,
    velocity: Velocity,
    dt: f64,
    error: &IntegrationError,
) -> Result<Pose, PositionError> {
    if dt < 0.0 {
        return Err(KinematicsError::NegativeTimeDelta("must be non-negative").into());
    }

    let a = normalize_angle(pose.a + velocity.a * dt * (1.0 + error.a));
    let cosa = a.cos();
    let sina = a.sin();
    let dx = velocity.x * dt * (1.0 + error.x);
    let dy = velocity.y * dt * (1.0 + error.y);

    Ok(Pose {
        x: pose.x + dx * cosa + dy * sina,
        y: pose.y - (dy * cosa - dx * sina),
        a,
    })
}
