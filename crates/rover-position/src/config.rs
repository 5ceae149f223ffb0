//! Load-time configuration of a position model.
//!
//! [`PositionConfig`] mirrors the `position` block of a world file and is
//! deserialized by whatever loader the host uses. [`PositionConfig::resolve`]
//! turns it into typed [`PositionSettings`], reporting bad values and falling
//! back to the documented defaults instead of failing.

use rover_kinematics::{DriveMode, Pose};
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::{error, warn};

use crate::controller::SpeedLimits;
use crate::localization::LocalizationMode;
use crate::odometry::ErrorBounds;

/// Raw position model properties as written in configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    /// `"diff"` or `"omni"`.
    pub drive: String,
    /// `"gps"` or `"odom"`.
    pub localization: String,
    /// Global pose of the localization frame, `[x, y, a]`. Defaults to the
    /// model's start pose.
    pub localization_origin: Option<[f64; 3]>,
    /// Maximum proportional odometry error per axis, `[x, y, a]`.
    pub odom_error: ErrorBounds,
    /// Position-control speed limits, `[x, y, a]`.
    pub max_speed: SpeedLimits,
    /// Removed property, only detected so it can be reported.
    pub odom: Option<IgnoredAny>,
}

impl Default for PositionConfig {
    fn default() -> Self {
        PositionConfig {
            drive: DriveMode::Differential.as_str().to_string(),
            localization: LocalizationMode::Exact.as_str().to_string(),
            localization_origin: None,
            odom_error: ErrorBounds::default(),
            max_speed: SpeedLimits::default(),
            odom: None,
        }
    }
}

/// Typed, validated position model settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionSettings {
    /// Drivetrain topology.
    pub drive: DriveMode,
    /// How the estimate is computed.
    pub localization: LocalizationMode,
    /// Localization frame override. `None` uses the true pose at configuration time.
    pub origin: Option<Pose>,
    /// Bounds the integration error is sampled from at creation.
    pub error_bounds: ErrorBounds,
    /// Position-control speed limits.
    pub speed_limits: SpeedLimits,
}

impl PositionConfig {
    /// Validate the raw properties of the model called `name`.
    ///
    /// Invalid mode strings are logged and replaced by the defaults
    /// (differential drive, exact localization). So are negative or
    /// non-finite speed limits.
    pub fn resolve(&self, name: &str) -> PositionSettings {
        if self.odom.is_some() {
            warn!(
                model = name,
                "the odom property is no longer available; use localization_origin instead"
            );
        }

        let drive = self.drive.parse::<DriveMode>().unwrap_or_else(|err| {
            error!(
                model = name,
                drive = %self.drive,
                %err,
                "invalid position drive mode, using \"diff\""
            );
            DriveMode::Differential
        });

        let localization = self.localization.parse::<LocalizationMode>().unwrap_or_else(|err| {
            error!(
                model = name,
                localization = %self.localization,
                %err,
                "unrecognized localization mode, using \"gps\""
            );
            LocalizationMode::Exact
        });

        let speed_limits = if self.max_speed.is_valid() {
            self.max_speed
        } else {
            let fallback = SpeedLimits::default();
            error!(
                model = name,
                max_speed = ?self.max_speed,
                "max_speed must be finite and non-negative, using [{}, {}, {}]",
                fallback.x,
                fallback.y,
                fallback.a
            );
            fallback
        };

        PositionSettings {
            drive,
            localization,
            origin: self.localization_origin.map(|[x, y, a]| Pose::new(x, y, a)),
            error_bounds: self.odom_error,
            speed_limits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_resolves_to_defaults() {
        let settings = PositionConfig::default().resolve("robot");
        assert_eq!(settings, PositionSettings::default());
        assert_eq!(settings.drive, DriveMode::Differential);
        assert_eq!(settings.localization, LocalizationMode::Exact);
        assert_eq!(settings.error_bounds, ErrorBounds::new(0.03, 0.03, 0.05));
        assert_eq!(settings.speed_limits, SpeedLimits::from([0.4, 0.4, 1.0]));
    }

    #[test]
    fn test_resolve_valid_modes() {
        let config = PositionConfig {
            drive: "omni".into(),
            localization: "odom".into(),
            localization_origin: Some([1.0, 2.0, 0.5]),
            ..Default::default()
        };
        let settings = config.resolve("robot");
        assert_eq!(settings.drive, DriveMode::Omnidirectional);
        assert_eq!(settings.localization, LocalizationMode::DeadReckoning);
        assert_eq!(settings.origin, Some(Pose::new(1.0, 2.0, 0.5)));
    }

    #[test]
    fn test_resolve_invalid_modes_fall_back() {
        let config = PositionConfig {
            drive: "tank".into(),
            localization: "beacon".into(),
            odom: Some(IgnoredAny),
            ..Default::default()
        };
        let settings = config.resolve("robot");
        assert_eq!(settings.drive, DriveMode::Differential);
        assert_eq!(settings.localization, LocalizationMode::Exact);
    }

    #[test]
    fn test_resolve_invalid_speed_limits_fall_back() {
        for max_speed in [[-0.4, 0.4, 1.0], [0.4, f64::NAN, 1.0], [0.4, 0.4, f64::INFINITY]] {
            let config = PositionConfig {
                drive: "omni".into(),
                max_speed: SpeedLimits::from(max_speed),
                ..Default::default()
            };
            assert_eq!(config.resolve("robot").speed_limits, SpeedLimits::default());
        }

        let config = PositionConfig {
            max_speed: SpeedLimits::from([0.0, 0.2, 0.5]),
            ..Default::default()
        };
        assert_eq!(config.resolve("robot").speed_limits, SpeedLimits::from([0.0, 0.2, 0.5]));
    }
}
