use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use tracing::{error, info};

use rover_kinematics::Pose;
use rover_position::PositionConfig;

use crate::mission::MissionConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Simulation clock and robot placement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimSection {
    /// Length of one tick (ms).
    pub tick_ms: u64,
    /// Simulated time before the run ends (s).
    pub duration_s: f64,
    /// Global start pose `[x, y, a]`.
    pub start_pose: [f64; 3],
    /// Seed for the process random source. Drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Log a telemetry line every this many ticks.
    pub log_every: u64,
}

impl Default for SimSection {
    fn default() -> Self {
        SimSection {
            tick_ms: 100,
            duration_s: 30.0,
            start_pose: [0.0, 0.0, 0.0],
            seed: None,
            log_every: 10,
        }
    }
}

impl SimSection {
    pub fn start_pose(&self) -> Pose {
        let [x, y, a] = self.start_pose;
        Pose::new(x, y, a)
    }

    /// Number of ticks in the run.
    pub fn ticks(&self) -> u64 {
        let tick_s = self.tick_ms.max(1) as f64 / 1e3;
        (self.duration_s.max(0.0) / tick_s).round() as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub sim: SimSection,
    pub position: PositionConfig,
    pub mission: MissionConfig,
}

/// Load the configuration file at `path`, overridden by `ROVER_`-prefixed
/// environment variables (`ROVER_POSITION__DRIVE=omni`).
pub fn load_config(path: &str) -> Result<SimConfig, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let builder = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("ROVER")
                .prefix_separator("_")
                .separator("__"),
        );

    match build(builder) {
        Ok(config) => {
            info!("Successfully loaded configuration: {:?}", config);
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<SimConfig, ConfigError> {
    builder.build()?.try_deserialize::<SimConfig>()
}
