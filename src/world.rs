use std::time::Duration;

use rover_kinematics::{Pose, Velocity, normalize_angle};
use rover_position::Engine;

/// Ground truth for a single robot on an empty, frictionless floor.
///
/// Velocities are applied exactly: the heading is advanced first and the
/// body-frame translation follows the new heading.
#[derive(Debug, Clone)]
pub struct SimWorld {
    pose: Pose,
    dt: Duration,
    active: bool,
    odometer: f64,
}

impl SimWorld {
    pub fn new(start: Pose, dt: Duration) -> Self {
        SimWorld {
            pose: start,
            dt,
            active: false,
            odometer: 0.0,
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Total path length driven so far (m).
    pub fn odometer(&self) -> f64 {
        self.odometer
    }
}

impl Engine for SimWorld {
    fn true_pose(&self) -> Pose {
        self.pose
    }

    fn advance(&mut self, velocity: Velocity) {
        let dt = self.dt.as_secs_f64();
        self.pose.a = normalize_angle(self.pose.a + velocity.a * dt);
        let (sina, cosa) = self.pose.a.sin_cos();
        let dx = (velocity.x * cosa - velocity.y * sina) * dt;
        let dy = (velocity.x * sina + velocity.y * cosa) * dt;
        self.pose.x += dx;
        self.pose.y += dy;
        self.odometer += dx.hypot(dy);
    }

    fn tick_duration(&self) -> Duration {
        self.dt
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
