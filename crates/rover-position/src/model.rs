//! The position model: one simulated mobile base driven once per tick.

use std::time::Duration;

use rand::Rng;
use rover_kinematics::{DriveMode, Pose, Velocity};
use tracing::{debug, error, info};

use crate::PositionError;
use crate::config::PositionSettings;
use crate::controller::{Command, SpeedLimits, command_velocity};
use crate::localization::{LocalizationMode, PositionEstimate};
use crate::odometry::IntegrationError;

/// The simulation engine a position model runs inside.
///
/// The engine owns the true pose and moves the robot; the model only decides
/// how fast it should move and what it believes its pose to be.
pub trait Engine {
    /// The current ground-truth global pose.
    fn true_pose(&self) -> Pose;

    /// Hand off the velocity to actuate during the current tick.
    fn advance(&mut self, velocity: Velocity);

    /// Length of one simulation tick.
    fn tick_duration(&self) -> Duration;

    /// Whether any client is subscribed to the model. The base only moves while active.
    fn is_active(&self) -> bool;
}

/// What a single [`PositionModel::step`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Whether the model was active this tick.
    pub active: bool,
    /// Velocity handed to the engine.
    pub velocity: Velocity,
    /// Localization result after the tick.
    pub estimate: PositionEstimate,
    /// Whether the base is stalled. Collisions are the engine's concern, so
    /// the model always reports `false`.
    pub stalled: bool,
}

/// A simulated mobile base.
#[derive(Debug, Clone)]
pub struct PositionModel {
    name: String,
    drive: DriveMode,
    localization: LocalizationMode,
    limits: SpeedLimits,
    integration_error: IntegrationError,
    command: Command,
    velocity: Velocity,
    estimate: PositionEstimate,
    was_active: bool,
}

impl PositionModel {
    /// Create and configure a position model.
    ///
    /// The integration error is drawn from `rng` here, once, and never
    /// resampled for the lifetime of the model.
    ///
    /// # Arguments
    ///
    /// * `name`: Identifies the model in log output.
    /// * `settings`: Validated configuration.
    /// * `true_pose`: The model's global pose at creation.
    /// * `rng`: Random source, seeded once by the process.
    pub fn new<R: Rng + ?Sized>(
        name: impl Into<String>,
        settings: &PositionSettings,
        true_pose: Pose,
        rng: &mut R,
    ) -> Self {
        let integration_error = IntegrationError::sample(&settings.error_bounds, rng);
        let mut model = PositionModel {
            name: name.into(),
            drive: settings.drive,
            localization: settings.localization,
            limits: settings.speed_limits,
            integration_error,
            command: Command::STOP,
            velocity: Velocity::ZERO,
            estimate: PositionEstimate::default(),
            was_active: false,
        };
        model.configure(settings.drive, settings.localization, settings.origin, true_pose);
        info!(
            model = %model.name,
            drive = %model.drive,
            localization = %model.localization,
            error = ?model.integration_error,
            "created position model"
        );
        model
    }

    /// Set the drivetrain, localization mode and localization frame.
    ///
    /// The estimate restarts with perfect knowledge of the pose relative to
    /// the new origin, which defaults to `true_pose`. The integration error
    /// is not resampled.
    pub fn configure(
        &mut self,
        drive: DriveMode,
        localization: LocalizationMode,
        origin: Option<Pose>,
        true_pose: Pose,
    ) {
        self.drive = drive;
        self.localization = localization;
        self.estimate = PositionEstimate::at_origin(origin.unwrap_or(true_pose), true_pose);
        debug!(
            model = %self.name,
            origin = %self.estimate.origin,
            pose = %self.estimate.pose,
            "position model configured"
        );
    }

    /// Configure from untyped drive and localization codes.
    ///
    /// An unknown code is reported and replaced by its default (differential
    /// drive, exact localization); the model is configured either way.
    ///
    /// # Errors
    ///
    /// Returns the first unknown code as `PositionError::Kinematics` (drive)
    /// or `PositionError::UnknownLocalizationCode`.
    pub fn configure_raw(
        &mut self,
        drive_code: u8,
        localization_code: u8,
        origin: Option<Pose>,
        true_pose: Pose,
    ) -> Result<(), PositionError> {
        let drive = DriveMode::try_from(drive_code).map_err(PositionError::from);
        let localization = LocalizationMode::try_from(localization_code);

        if let Err(err) = &drive {
            error!(model = %self.name, %err, "invalid drive mode code, using \"diff\"");
        }
        if let Err(err) = &localization {
            error!(model = %self.name, %err, "invalid localization mode code, using \"gps\"");
        }

        self.configure(
            drive.clone().unwrap_or_default(),
            localization.clone().unwrap_or_default(),
            origin,
            true_pose,
        );
        drive.and(localization).map(|_| ())
    }

    /// Replace the stored command. Takes effect on the next [`PositionModel::step`].
    pub fn set_command(&mut self, command: Command) {
        self.command = command;
    }

    /// Replace the stored command from an untyped mode code.
    ///
    /// An unknown code is reported and the model is told to stop, so the
    /// robot stands still rather than acting on a misread command.
    ///
    /// # Errors
    ///
    /// Returns `Err(PositionError::UnknownControlCode)` for an unknown code.
    pub fn set_raw_command(&mut self, code: u8, x: f64, y: f64, a: f64) -> Result<(), PositionError> {
        match Command::from_raw(code, x, y, a) {
            Ok(command) => {
                self.command = command;
                Ok(())
            }
            Err(err) => {
                error!(model = %self.name, %err, "unrecognized position command mode");
                self.command = Command::STOP;
                Err(err)
            }
        }
    }

    /// Advance the model by one tick.
    ///
    /// Computes the velocity from the stored command (or zero while inactive),
    /// hands it to the engine, then updates the estimate from the engine's new
    /// true pose. Errors are reported and never abort the simulation.
    pub fn step<E: Engine + ?Sized>(&mut self, engine: &mut E) -> StepReport {
        let active = engine.is_active();
        if self.was_active && !active {
            self.shutdown();
        }
        self.was_active = active;

        self.velocity = if active {
            command_velocity(&self.command, self.drive, &self.estimate.pose, &self.limits)
        } else {
            Velocity::ZERO
        };
        debug!(model = %self.name, velocity = %self.velocity, active, "velocity computed");

        engine.advance(self.velocity);

        let dt = engine.tick_duration().as_secs_f64();
        if let Err(err) = self.estimate.update(
            self.localization,
            engine.true_pose(),
            self.velocity,
            dt,
            &self.integration_error,
        ) {
            error!(model = %self.name, %err, "position estimate not updated");
        }

        StepReport {
            active,
            velocity: self.velocity,
            estimate: self.estimate,
            stalled: false,
        }
    }

    /// Safety stop: zero the command and the velocity.
    ///
    /// Called by [`PositionModel::step`] when the model goes inactive.
    pub fn shutdown(&mut self) {
        info!(model = %self.name, "position model shutdown");
        self.command = Command::STOP;
        self.velocity = Velocity::ZERO;
    }

    /// The current localization result.
    pub fn estimate(&self) -> &PositionEstimate {
        &self.estimate
    }

    /// The velocity computed on the last tick.
    pub fn velocity(&self) -> Velocity {
        self.velocity
    }

    /// The stored command.
    pub fn command(&self) -> Command {
        self.command
    }

    /// The drivetrain topology.
    pub fn drive(&self) -> DriveMode {
        self.drive
    }

    /// The localization mode.
    pub fn localization(&self) -> LocalizationMode {
        self.localization
    }

    /// The integration error drawn at creation.
    pub fn integration_error(&self) -> IntegrationError {
        self.integration_error
    }

    /// The name used in log output.
    pub fn name(&self) -> &str {
        &self.name
    }
}
