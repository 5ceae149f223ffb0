#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for planar mobile-base kinematics."]
#![doc = ""]
#![doc = "This crate provides pose and velocity types, angle normalization, origin-frame"]
#![doc = "transforms, and the velocity constraints of differential and omnidirectional drives."]

use core::f64::consts::{PI, TAU};
use core::fmt;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod drive;
pub mod error;
pub use drive::DriveMode;
pub use error::KinematicsError;

/// Normalize an angle to be within `(-PI, PI]`.
///
/// Angles at `-PI` will be normalized to `PI`.
///
/// # Arguments
///
/// * `angle`: The angle in radians to normalize.
///
/// # Returns
///
/// The normalized angle in radians.
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle % TAU;
    if a > PI {
        a - TAU
    } else if a <= -PI {
        a + TAU
    } else {
        a
    }
}

/// A 2‑D pose `(x, y, a)` in meters and radians (`a` measured counter‑clockwise
/// from the x‑axis of whichever frame the pose is expressed in).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// x position (m).
    pub x: f64,
    /// y position (m).
    pub y: f64,
    /// Heading (rad), normalized to `(-PI, PI]`.
    pub a: f64,
}

impl Pose {
    /// Construct a new pose. The heading is stored as given.
    ///
    /// # Arguments
    ///
    /// * `x`: x position in meters.
    /// * `y`: y position in meters.
    /// * `a`: Heading in radians.
    pub const fn new(x: f64, y: f64, a: f64) -> Self {
        Pose { x, y, a }
    }

    /// Express this global pose relative to `origin`.
    ///
    /// Translates by `-origin` and rotates by `-origin.a`; the result is the
    /// pose as seen by an observer standing at `origin`.
    ///
    /// # Arguments
    ///
    /// * `origin`: The reference frame, expressed in the same global frame as `self`.
    ///
    /// # Returns
    ///
    /// The origin-relative pose with its heading normalized to `(-PI, PI]`.
    pub fn to_local(&self, origin: &Pose) -> Pose {
        let cosa = cos(origin.a);
        let sina = sin(origin.a);
        let dx = self.x - origin.x;
        let dy = self.y - origin.y;

        Pose {
            x: dx * cosa + dy * sina,
            y: dy * cosa - dx * sina,
            a: normalize_angle(self.a - origin.a),
        }
    }

    /// Inverse of [`Pose::to_local`]: express an origin-relative pose in the
    /// global frame.
    ///
    /// # Arguments
    ///
    /// * `origin`: The reference frame `self` is expressed in.
    ///
    /// # Returns
    ///
    /// The global pose with its heading normalized to `(-PI, PI]`.
    pub fn to_global(&self, origin: &Pose) -> Pose {
        let cosa = cos(origin.a);
        let sina = sin(origin.a);

        Pose {
            x: origin.x + self.x * cosa - self.y * sina,
            y: origin.y + self.x * sina + self.y * cosa,
            a: normalize_angle(self.a + origin.a),
        }
    }

    /// Component-wise difference `self - other` with the heading difference normalized.
    pub fn difference(&self, other: &Pose) -> Pose {
        Pose {
            x: self.x - other.x,
            y: self.y - other.y,
            a: normalize_angle(self.a - other.a),
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.3}, y: {:.3}, a: {:.3} rad)", self.x, self.y, self.a)
    }
}

/// A velocity expressed in the robot base frame.
///
/// `x` is forward, `y` is lateral (positive to the left) and `a` is the turn
/// rate about the vertical axis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    /// Forward velocity (m/s).
    pub x: f64,
    /// Lateral velocity (m/s).
    pub y: f64,
    /// Angular velocity (rad/s).
    pub a: f64,
}

impl Velocity {
    /// A velocity of zero on every axis.
    pub const ZERO: Velocity = Velocity::new(0.0, 0.0, 0.0);

    /// Construct a new velocity.
    ///
    /// # Arguments
    ///
    /// * `x`: Forward velocity (m/s).
    /// * `y`: Lateral velocity (m/s).
    /// * `a`: Angular velocity (rad/s).
    pub const fn new(x: f64, y: f64, a: f64) -> Self {
        Velocity { x, y, a }
    }

    /// Returns true if every component is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.a == 0.0
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(vx: {:.3} m/s, vy: {:.3} m/s, va: {:.3} rad/s)", self.x, self.y, self.a)
    }
}
