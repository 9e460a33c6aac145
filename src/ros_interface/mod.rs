//! ROS 2 interface for the approach states
//!
//! This module connects the states to a running ROS 2 graph:
//! - odometry subscription as motion telemetry
//! - say-messages published as user notifications
//!
//! The node is spun on a background thread started by [`RosInterface::initialize`].

mod publisher;
mod subscriber;

use r2r::{Context, Node};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

pub use publisher::*;
pub use subscriber::*;

use crate::RosConfig;

/// ROS 2 interface manager
pub struct RosInterface {
    node: Arc<Mutex<Node>>,
    config: RosConfig,
    running: Arc<AtomicBool>,
    spinner: Option<JoinHandle<()>>,
}

pub(crate) fn lock_node(node: &Mutex<Node>) -> MutexGuard<'_, Node> {
    node.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RosInterface {
    /// Create a new ROS interface
    pub fn new(config: &RosConfig) -> Result<Self, RosError> {
        let context = Context::create()?;
        let node = Node::create(context, &config.node_name, "")?;

        Ok(RosInterface {
            node: Arc::new(Mutex::new(node)),
            config: config.clone(),
            running: Arc::new(AtomicBool::new(false)),
            spinner: None,
        })
    }

    /// Starts spinning the node on a background thread
    pub fn initialize(&mut self) -> Result<(), RosError> {
        if self.spinner.is_some() {
            return Ok(());
        }
        log::info!("Initializing ROS interface...");

        self.running.store(true, Ordering::Release);
        let node = self.node.clone();
        let running = self.running.clone();
        let spinner = std::thread::Builder::new()
            .name("ros-spin".to_string())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    lock_node(&node).spin_once(Duration::from_millis(100));
                }
            })
            .map_err(|e| RosError::InitError(e.to_string()))?;
        self.spinner = Some(spinner);

        log::info!("ROS interface initialized successfully");
        Ok(())
    }

    /// Motion telemetry backed by the configured odometry topic
    pub fn telemetry(&self) -> OdometryTelemetry {
        OdometryTelemetry::new(self.node.clone(), &self.config.odometry_topic)
    }

    /// Notification sink publishing on the configured say topic
    pub fn notifier(&self) -> Result<TopicNotifier, RosError> {
        TopicNotifier::new(&mut lock_node(&self.node), &self.config.say_topic)
    }

    /// Stops the spin thread
    pub fn shutdown(&mut self) -> Result<(), RosError> {
        log::info!("Shutting down ROS interface...");
        self.running.store(false, Ordering::Release);
        if let Some(spinner) = self.spinner.take() {
            spinner
                .join()
                .map_err(|_| RosError::InitError("spin thread panicked".to_string()))?;
        }
        log::info!("ROS interface shutdown complete");
        Ok(())
    }
}

impl Drop for RosInterface {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("{}", e);
        }
    }
}

/// ROS error types
#[derive(Debug)]
pub enum RosError {
    /// ROS initialization error
    InitError(String),
    /// Publishing error
    PublishError(String),
    /// Subscription error
    SubscribeError(String),
}

impl std::fmt::Display for RosError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RosError::InitError(msg) => write!(f, "ROS init error: {}", msg),
            RosError::PublishError(msg) => write!(f, "Publish error: {}", msg),
            RosError::SubscribeError(msg) => write!(f, "Subscribe error: {}", msg),
        }
    }
}

impl std::error::Error for RosError {}

impl From<r2r::Error> for RosError {
    fn from(e: r2r::Error) -> Self {
        RosError::InitError(e.to_string())
    }
}
