mod blackboard; // shared state between the simulation thread and async tasks
mod bus;        // telemetry broadcast topic
mod mission;    // the client that commands the robot
mod settings;   // configuration loading
mod world;      // ground truth engine

use blackboard::{Blackboard, raise_fault, snapshot};
use bus::{Telemetry, Topic};
use mission::Mission;
use settings::{DEFAULT_CONFIG_PATH, SimConfig, SimSection};
use world::SimWorld;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rover_kinematics::Pose;
use rover_position::{Engine, PositionEstimate, PositionModel};
use spin_sleep::SpinSleeper;
use std::{sync::Arc, thread::JoinHandle, time::{Duration, Instant}};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

/// End state of a simulation run.
#[derive(Debug, Clone)]
struct SimSummary {
    ticks: u64,
    true_pose: Pose,
    estimate: PositionEstimate,
    odometer: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Rover simulation started.");

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = settings::load_config(&path)?;

    match run(config).await {
        Ok(summary) => {
            let drift = summary.estimate.pose_error;
            info!(
                ticks = summary.ticks,
                true_pose = %summary.true_pose,
                origin = %summary.estimate.origin,
                estimate = %summary.estimate.pose,
                drift_m = drift.x.hypot(drift.y),
                drift_rad = drift.a,
                odometer_m = summary.odometer,
                "Simulation finished."
            );
            Ok(())
        }
        Err(e) => {
            error!("Simulation failed: {:?}", e);
            Err(e)
        }
    }
}

async fn run(config: SimConfig) -> anyhow::Result<SimSummary> {
    info!("Simulation setup started.");
    let bb: Blackboard = Arc::default();
    let telemetry: Topic<Telemetry> = Topic::new(16);
    let mut telemetry_rx = telemetry.subscribe();

    // The process random source is seeded exactly once, here.
    let mut rng = match config.sim.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let settings = config.position.resolve("rover");
    let start = config.sim.start_pose();
    let model = PositionModel::new("rover", &settings, start, &mut rng);
    {
        let mut g = bb.write();
        g.true_pose = start;
        g.estimate = *model.estimate();
    }

    info!("Spawning simulation thread...");
    let sim = std::thread::Builder::new()
        .name("sim".into())
        .spawn({
            let bb = Arc::clone(&bb);
            let sim_cfg = config.sim.clone();
            move || simulate(bb, telemetry, model, sim_cfg)
        })?;

    let mission = Mission::from_config(&config.mission);
    let cmd_timeout = Duration::from_millis(config.mission.cmd_timeout_ms);
    let summary = supervise(bb.clone(), &mut telemetry_rx, mission, cmd_timeout, sim).await?;

    let faults = snapshot(&bb).faults;
    if !faults.is_empty() {
        warn!(?faults, "Faults raised during the run.");
    }
    Ok(summary)
}

/// Run the async tasks until the simulation ends, then collect its summary.
async fn supervise(
    bb: Blackboard,
    telemetry_rx: &mut broadcast::Receiver<Arc<Telemetry>>,
    mission: Mission,
    cmd_timeout: Duration,
    sim: JoinHandle<SimSummary>,
) -> anyhow::Result<SimSummary> {
    tokio::try_join!(
        mission::mission_task(bb.clone(), telemetry_rx, mission),
        watchdog(bb.clone(), cmd_timeout),
    )?;

    sim.join()
        .map_err(|_| anyhow::anyhow!("simulation thread panicked"))
}

/// Marks the run finished when dropped, so the async tasks also stop if the
/// simulation thread unwinds.
struct FinishOnDrop(Blackboard);

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        self.0.write().finished = true;
    }
}

/// Steps the model against the ground truth world at the configured tick rate.
fn simulate(bb: Blackboard, telemetry: Topic<Telemetry>, mut model: PositionModel, sim: SimSection) -> SimSummary {
    info!("Simulation thread started.");
    let _finish = FinishOnDrop(bb.clone());
    let dt = Duration::from_millis(sim.tick_ms.max(1));
    let ticks = sim.ticks();
    let mut world = SimWorld::new(sim.start_pose(), dt);
    let sleeper = SpinSleeper::new(10_000);
    let mut deadline = Instant::now();

    for tick in 1..=ticks {
        {
            let mut g = bb.write();
            if let Some(cmd) = g.pending_cmd.take() {
                model.set_command(cmd);
            }
            world.set_active(g.subscribed);
        }

        let report = model.step(&mut world);
        let true_pose = world.true_pose();
        {
            let mut g = bb.write();
            g.true_pose = true_pose;
            g.estimate = report.estimate;
            g.velocity = report.velocity;
        }

        if sim.log_every > 0 && tick % sim.log_every == 0 {
            info!(
                tick,
                active = report.active,
                true_pose = %true_pose,
                estimate = %report.estimate.pose,
                velocity = %report.velocity,
                "Telemetry"
            );
        }
        telemetry.publish(Telemetry { tick, true_pose, report });

        deadline += dt;
        let now = Instant::now();
        if deadline > now {
            sleeper.sleep(deadline - now);
        }
    }

    info!("Simulation thread finished.");
    SimSummary {
        ticks,
        true_pose: world.true_pose(),
        estimate: *model.estimate(),
        odometer: world.odometer(),
    }
}

async fn watchdog(bb: Blackboard, timeout: Duration) -> anyhow::Result<()> {
    info!("Watchdog task started.");
    let mut tick = tokio::time::interval(Duration::from_millis(25));
    loop {
        tick.tick().await;
        if bb.read().finished {
            info!("Watchdog task finished.");
            return Ok(());
        }
        release_if_stale(&bb, Instant::now(), timeout);
    }
}

/// Unsubscribe from the robot when the last command is older than `timeout`.
/// The position model then performs its safety stop on the next tick.
fn release_if_stale(bb: &Blackboard, now: Instant, timeout: Duration) -> bool {
    let state = snapshot(bb);
    let age = now.saturating_duration_since(state.last_cmd_ts);
    if state.subscribed && age > timeout {
        warn!(?age, last_cmd_ts = ?state.last_cmd_ts, "Command timeout! Releasing the robot.");
        bb.write().subscribed = false;
        raise_fault(bb, "cmd timeout");
        true
    } else {
        false
    }
}
