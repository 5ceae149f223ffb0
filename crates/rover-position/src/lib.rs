//! # rover-position
//!
//! The motion and localization core of a simulated mobile-robot base.
//!
//! A [`PositionModel`] is stepped once per simulation tick by the [`Engine`]
//! that owns the robot's true pose. Each tick it turns the stored
//! [`Command`] into a velocity the drivetrain can achieve, hands that velocity
//! to the engine, and updates its [`PositionEstimate`] either exactly from
//! the true pose or by dead reckoning with a persistent odometry error.

pub mod config;
pub mod controller;
pub mod error;
pub mod localization;
pub mod model;
pub mod odometry;

pub use config::{PositionConfig, PositionSettings};
pub use controller::{Command, ControlMode, SpeedLimits, command_velocity};
pub use error::PositionError;
pub use localization::{LocalizationMode, PositionEstimate};
pub use model::{Engine, PositionModel, StepReport};
pub use odometry::{ErrorBounds, IntegrationError};

pub use rover_kinematics::{DriveMode, Pose, Velocity, normalize_angle};
