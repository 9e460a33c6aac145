// src/ros_interface/subscriber.rs
// Odometry subscription used as motion telemetry by the approach states.

use super::lock_node;
use crate::navigation::{ActivityFlag, MotionTelemetry, Subscription, TelemetryError};
use futures::channel::oneshot;
use futures::{FutureExt, StreamExt};
use r2r::{Node, QosProfile};
use std::sync::{Arc, Mutex};

/// Marks the activity flag for every odometry message on `topic`.
pub struct OdometryTelemetry {
    node: Arc<Mutex<Node>>,
    topic: String,
}

impl OdometryTelemetry {
    /// Creates the telemetry source; nothing is subscribed until `subscribe`.
    pub fn new(node: Arc<Mutex<Node>>, topic: &str) -> Self {
        OdometryTelemetry {
            node,
            topic: topic.to_string(),
        }
    }
}

impl MotionTelemetry for OdometryTelemetry {
    fn subscribe(&self, flag: ActivityFlag) -> Result<Subscription, TelemetryError> {
        let stream = lock_node(&self.node)
            .subscribe::<r2r::nav_msgs::msg::Odometry>(&self.topic, QosProfile::default())
            .map_err(|e| TelemetryError::SubscribeFailed(format!("{}: {}", self.topic, e)))?;
        let (cancel, cancelled) = oneshot::channel::<()>();

        let topic = self.topic.clone();
        std::thread::Builder::new()
            .name("odometry".to_string())
            .spawn(move || {
                futures::executor::block_on(async move {
                    let mut messages = stream.fuse();
                    let mut cancelled = cancelled.fuse();
                    loop {
                        futures::select! {
                            msg = messages.next() => match msg {
                                Some(_) => flag.mark(),
                                None => break,
                            },
                            _ = cancelled => break,
                        }
                    }
                });
                log::debug!("Odometry subscription on {} closed", topic);
            })
            .map_err(|e| TelemetryError::SubscribeFailed(e.to_string()))?;

        // Dropping the stream in the worker unsubscribes from the topic
        Ok(Subscription::new(move || {
            let _ = cancel.send(());
        }))
    }
}
