use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

use rover_kinematics::{Pose, Velocity};
use rover_position::{Command, PositionEstimate};

/// State shared between the simulation thread and the async tasks.
#[derive(Clone)]
pub struct State {
    pub true_pose: Pose,
    pub estimate: PositionEstimate,
    pub velocity: Velocity,
    /// Written by the mission, taken by the simulation thread before the next tick.
    pub pending_cmd: Option<Command>,
    /// Whether a client is driving the robot. Cleared by the watchdog.
    pub subscribed: bool,
    pub last_cmd_ts: Instant,
    pub finished: bool,
    pub faults: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        State {
            true_pose: Pose::default(),
            estimate: PositionEstimate::default(),
            velocity: Velocity::default(),
            pending_cmd: None,
            subscribed: false,
            last_cmd_ts: Instant::now(),
            finished: false,
            faults: Vec::new(),
        }
    }
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

/// Queue a command for the next tick and (re)subscribe to the robot.
pub fn send_cmd(bb: &Blackboard, cmd: Command) {
    let mut g = bb.write();
    g.pending_cmd = Some(cmd);
    g.subscribed = true;
    g.last_cmd_ts = Instant::now();
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_cmd_subscribes() {
        let bb: Blackboard = Arc::default();
        assert!(!snapshot(&bb).subscribed);
        send_cmd(&bb, Command::velocity(0.1, 0.0, 0.0));
        let state = snapshot(&bb);
        assert!(state.subscribed);
        assert_eq!(state.pending_cmd, Some(Command::velocity(0.1, 0.0, 0.0)));
    }

    #[test]
    fn test_raise_fault_deduplicates() {
        let bb: Blackboard = Arc::default();
        raise_fault(&bb, "cmd timeout");
        raise_fault(&bb, "cmd timeout");
        raise_fault(&bb, "other");
        assert_eq!(snapshot(&bb).faults, vec!["cmd timeout", "other"]);
    }
}
