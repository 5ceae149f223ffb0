use std::sync::Arc;
use tokio::sync::broadcast;

use rover_kinematics::Pose;
use rover_position::StepReport;

/// One tick of simulation output, as published on the telemetry topic.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub tick: u64,
    pub true_pose: Pose,
    pub report: StepReport,
}

/// Broadcast topic with bounded capacity.
/// `T` must be `Send + Sync` because we hop from the simulation thread to the runtime.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish to every current subscriber. Returns how many received it.
    pub fn publish(&self, msg: T) -> usize {
        // No subscribers is not an error for telemetry.
        self.tx.send(Arc::new(msg)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let topic: Topic<u32> = Topic::new(4);
        assert_eq!(topic.publish(1), 0);
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let topic: Topic<u32> = Topic::new(4);
        let mut a = topic.subscribe();
        let mut b = topic.clone().subscribe();
        assert_eq!(topic.publish(7), 2);
        assert_eq!(*a.try_recv().unwrap(), 7);
        assert_eq!(*b.try_recv().unwrap(), 7);
    }
}
