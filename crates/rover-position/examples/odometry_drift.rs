use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rover_position::*;

/// Moves the robot exactly as commanded.
struct Ground {
    pose: Pose,
    dt: Duration,
}

impl Engine for Ground {
    fn true_pose(&self) -> Pose {
        self.pose
    }

    fn advance(&mut self, v: Velocity) {
        let dt = self.dt.as_secs_f64();
        self.pose.a = normalize_angle(self.pose.a + v.a * dt);
        let (sina, cosa) = self.pose.a.sin_cos();
        self.pose.x += (v.x * cosa - v.y * sina) * dt;
        self.pose.y += (v.x * sina + v.y * cosa) * dt;
    }

    fn tick_duration(&self) -> Duration {
        self.dt
    }

    fn is_active(&self) -> bool {
        true
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut rng = StdRng::seed_from_u64(2004);
    let start = Pose::new(0.0, 0.0, 0.0);
    let command = Command::velocity(0.4, 0.0, 0.2);
    let num_steps = 300;

    let mut exact_world = Ground { pose: start, dt: Duration::from_millis(100) };
    let mut odom_world = Ground { pose: start, dt: Duration::from_millis(100) };

    let exact_settings = PositionSettings {
        localization: LocalizationMode::Exact,
        ..Default::default()
    };
    let odom_settings = PositionSettings {
        localization: LocalizationMode::DeadReckoning,
        error_bounds: ErrorBounds::new(0.05, 0.05, 0.1),
        ..Default::default()
    };

    let mut exact = PositionModel::new("gps", &exact_settings, start, &mut rng);
    let mut odom = PositionModel::new("odom", &odom_settings, start, &mut rng);
    exact.set_command(command);
    odom.set_command(command);

    println!("Initializing simulation...");
    println!("  Command:           {:?}", command);
    println!("  Integration error: {:?}", odom.integration_error());
    println!("  Num Steps:         {}", num_steps);
    println!("\nSimulating...");

    for i in 0..num_steps {
        let gps = exact.step(&mut exact_world);
        let dr = odom.step(&mut odom_world);
        if (i + 1) % 30 == 0 {
            let e = dr.estimate.pose_error;
            println!(
                "Step {:>3}: gps {}  odom {}  drift {:.3} m",
                i + 1,
                gps.estimate.pose,
                dr.estimate.pose,
                e.x.hypot(e.y)
            );
        }
    }

    println!("\nSimulation complete.");
    println!("Final true pose: {}", odom_world.pose);
}
