use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time;

use rover_kinematics::{Pose, normalize_angle};
use rover_position::Command;

use crate::blackboard::{Blackboard, send_cmd};
use crate::bus::Telemetry;

/// What the mission client asks of the robot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// `"position"` to visit `waypoints`, `"velocity"` to hold `velocity`.
    pub control: String,
    /// Target poses `[x, y, a]` in the localization frame, visited in order.
    pub waypoints: Vec<[f64; 3]>,
    /// Body-frame velocity `[x, y, a]` for velocity missions.
    pub velocity: [f64; 3],
    /// How long a velocity mission drives before it stops commanding (s).
    pub velocity_duration_s: f64,
    /// Distance and heading error under which a waypoint counts as reached.
    pub tolerance: f64,
    /// Commands older than this make the watchdog release the robot (ms).
    pub cmd_timeout_ms: u64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        MissionConfig {
            control: "position".to_string(),
            waypoints: vec![[1.0, 0.0, 0.0], [1.0, 1.0, std::f64::consts::FRAC_PI_2]],
            velocity: [0.2, 0.0, 0.1],
            velocity_duration_s: 10.0,
            tolerance: 0.05,
            cmd_timeout_ms: 500,
        }
    }
}

/// Decides which command to send given the latest position estimate.
#[derive(Debug, Clone)]
pub enum Mission {
    Waypoints {
        targets: Vec<Pose>,
        next: usize,
        tolerance: f64,
    },
    Cruise {
        command: Command,
        remaining: Duration,
    },
}

impl Mission {
    pub fn from_config(config: &MissionConfig) -> Self {
        match config.control.as_str() {
            "velocity" => {
                let [x, y, a] = config.velocity;
                Mission::Cruise {
                    command: Command::velocity(x, y, a),
                    remaining: Duration::from_secs_f64(config.velocity_duration_s.max(0.0)),
                }
            }
            other => {
                if other != "position" {
                    tracing::error!(
                        control = other,
                        "unknown mission control mode, valid choices are \"position\" and \"velocity\"; using \"position\""
                    );
                }
                Mission::Waypoints {
                    targets: config
                        .waypoints
                        .iter()
                        .map(|&[x, y, a]| Pose::new(x, y, a))
                        .collect(),
                    next: 0,
                    tolerance: config.tolerance,
                }
            }
        }
    }

    /// The command for this cycle, or `None` once the mission is complete.
    pub fn next_command(&mut self, estimate: &Pose, elapsed: Duration) -> Option<Command> {
        match self {
            Mission::Waypoints { targets, next, tolerance } => {
                while let Some(target) = targets.get(*next) {
                    let distance = (target.x - estimate.x).hypot(target.y - estimate.y);
                    let heading = normalize_angle(target.a - estimate.a).abs();
                    if distance < *tolerance && heading < *tolerance {
                        tracing::info!(waypoint = *next, %target, %estimate, "waypoint reached");
                        *next += 1;
                    } else {
                        return Some(Command::position(target.x, target.y, target.a));
                    }
                }
                None
            }
            Mission::Cruise { command, remaining } => {
                *remaining = remaining.saturating_sub(elapsed);
                if remaining.is_zero() { None } else { Some(*command) }
            }
        }
    }
}

/// 20 Hz mission task
pub async fn mission_task(
    bb: Blackboard,
    telemetry_rx: &mut broadcast::Receiver<Arc<Telemetry>>,
    mut mission: Mission,
) -> anyhow::Result<()> {
    tracing::info!(?mission, "Mission task started.");
    let period = Duration::from_millis(50); // 20 Hz
    let mut ticker = time::interval(period);
    let mut estimate = bb.read().estimate.pose;
    let mut complete = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if bb.read().finished {
                    tracing::info!("Mission task finished.");
                    return Ok(());
                }
                match mission.next_command(&estimate, period) {
                    Some(cmd) => {
                        tracing::debug!(?cmd, %estimate, "Sending command");
                        send_cmd(&bb, cmd);
                    }
                    None if !complete => {
                        // Stop commanding; the watchdog releases the robot.
                        tracing::info!(%estimate, "Mission complete.");
                        complete = true;
                    }
                    None => {}
                }
            }
            Ok(telemetry) = telemetry_rx.recv() => {
                estimate = telemetry.report.estimate.pose;
            }
        }
    }
}
