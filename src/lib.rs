//! Generic navigation states
//!
//! Task-level states that drive a mobile base to a target pose with a
//! coarse-then-fine move strategy, watching odometry to detect when the
//! robot is stuck. The state-machine executor and the robot-command façade
//! are external; this crate defines the contracts it expects from them.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod core;
pub mod navigation;
pub mod sim;
#[cfg(feature = "ros")]
pub mod ros_interface;

// Re-export commonly used items for easier access
pub use crate::core::{Outcome, State, UserData};
pub use navigation::{
    ActivityFlag, ApproachPose, LogNotifier, MotionError, MotionFacade, MotionTelemetry, MoveHandle,
    MoveStatus, NotificationSink, Phase, Pose2D, PoseDescriptor, PoseError, Robot, StallPolicy,
    Subscription, TelemetryError,
};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatesConfig {
    /// Parameters of the approach states
    pub approach: ApproachConfig,
    /// Polling and stall detection
    pub monitor: MonitorConfig,
    /// User-facing notices
    pub messages: MessagesConfig,
    /// ROS topic names
    pub ros: RosConfig,
    /// Simulated base used by the demo binary and tests
    pub sim: sim::SimConfig,
}

impl StatesConfig {
    /// Parses a configuration from YAML text
    pub fn from_yaml(src: &str) -> Result<Self, StatesError> {
        serde_yaml::from_str(src).map_err(|e| StatesError::ConfigError(e.to_string()))
    }

    /// Loads a configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StatesError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| StatesError::IoError(format!("{}: {}", path.display(), e)))?;
        serde_yaml::from_reader(file).map_err(|e| StatesError::ConfigError(e.to_string()))
    }
}

/// Construction parameters of an approach state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproachConfig {
    /// Explicit target; overrides the `base_pose` userdata when set
    pub pose: Option<PoseDescriptor>,
    /// Motion profile tag passed to the façade unmodified
    pub mode: String,
    /// Treat the first move as final (no corrective second move)
    pub skip_fine_phase: bool,
}

impl Default for ApproachConfig {
    fn default() -> Self {
        ApproachConfig {
            pose: None,
            mode: "omni".to_string(),
            skip_fine_phase: false,
        }
    }
}

/// Polling loop tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sleep between polls while the move is in flight (milliseconds)
    pub tick_ms: u64,
    /// Consecutive idle ticks tolerated before the path counts as blocked
    pub stall_threshold: u32,
    /// End the approach as soon as the façade reports a failed move.
    /// Off by default: a failed move then looks like one still in progress
    /// and is only caught by stall detection.
    pub abort_on_move_failure: bool,
}

impl MonitorConfig {
    /// Tick length as a duration
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            tick_ms: 1000,
            stall_threshold: 10,
            abort_on_move_failure: false,
        }
    }
}

/// Texts announced through the notification sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Announced by the retrying state each time the path counts as blocked
    pub stalled: String,
    /// Announced by the non-retrying state before it gives up
    pub abort: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        MessagesConfig {
            stalled: "I can not reach my target position because my path or target is blocked"
                .to_string(),
            abort: "I can not reach my target position because my path or target is blocked, I will abort."
                .to_string(),
        }
    }
}

/// ROS specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosConfig {
    /// Node name
    pub node_name: String,
    /// Odometry topic used as the motion telemetry source
    pub odometry_topic: String,
    /// Topic receiving say-messages
    pub say_topic: String,
}

impl Default for RosConfig {
    fn default() -> Self {
        RosConfig {
            node_name: "generic_states".to_string(),
            odometry_topic: "/base_controller/odometry".to_string(),
            say_topic: "/sound/say".to_string(),
        }
    }
}

/// Crate-level error types
#[derive(Debug)]
pub enum StatesError {
    /// Configuration file could not be read
    IoError(String),
    /// Configuration could not be parsed
    ConfigError(String),
}

impl std::fmt::Display for StatesError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            StatesError::IoError(msg) => write!(f, "I/O error: {}", msg),
            StatesError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for StatesError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_state_parameters() {
        let config = StatesConfig::default();
        assert_eq!(config.approach.mode, "omni");
        assert!(!config.approach.skip_fine_phase);
        assert!(config.approach.pose.is_none());
        assert_eq!(config.monitor.stall_threshold, 10);
        assert_eq!(config.monitor.tick(), Duration::from_secs(1));
        assert!(!config.monitor.abort_on_move_failure);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = StatesConfig::from_yaml(
            "approach:\n  pose: [1.0, 2.0, 0.0]\n  mode: linear\nmonitor:\n  tick_ms: 50\n",
        )
        .unwrap();
        assert_eq!(config.approach.pose, Some(Pose2D::new(1.0, 2.0, 0.0).into()));
        assert_eq!(config.approach.mode, "linear");
        assert_eq!(config.monitor.tick_ms, 50);
        assert_eq!(config.monitor.stall_threshold, 10);
        assert_eq!(config.ros.odometry_topic, "/base_controller/odometry");
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = StatesConfig::from_yaml("approach: [").unwrap_err();
        assert!(matches!(err, StatesError::ConfigError(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = StatesConfig::from_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, StatesError::IoError(_)));
    }
}
