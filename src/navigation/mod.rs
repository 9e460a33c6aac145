//! Approach states for the mobile base
//!
//! [`ApproachPose`] drives the base to a target with a coarse move followed
//! by a corrective fine move, watching motion telemetry to notice when the
//! robot stands still. The two flavours differ only in what a sustained stall
//! leads to: the retrying state announces it and keeps going, the bounded
//! state announces it, stops the base and fails.

pub mod motion;
pub mod pose;
pub mod telemetry;

pub use motion::{LogNotifier, MotionError, MotionFacade, MoveHandle, MoveStatus, NotificationSink};
pub use pose::{Pose2D, PoseDescriptor, PoseError};
pub use telemetry::{ActivityFlag, MotionTelemetry, Subscription, TelemetryError};

use crate::core::{Outcome, State, UserData};
use crate::{ApproachConfig, MessagesConfig, MonitorConfig, StatesConfig};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::thread;

/// Userdata key holding the inherited target pose
pub const BASE_POSE_KEY: &str = "base_pose";

const OUTCOMES: &[&str] = &["succeeded", "failed"];
const INPUT_KEYS: &[&str] = &[BASE_POSE_KEY];

/// External collaborators an approach state drives
#[derive(Clone)]
pub struct Robot {
    /// Command façade for the base
    pub base: Arc<dyn MotionFacade>,
    /// Odometry feed used to tell whether the base is moving
    pub telemetry: Arc<dyn MotionTelemetry>,
    /// Speech or display output
    pub notifier: Arc<dyn NotificationSink>,
}

impl Robot {
    /// Bundles the three collaborators
    pub fn new(
        base: Arc<dyn MotionFacade>,
        telemetry: Arc<dyn MotionTelemetry>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Robot {
            base,
            telemetry,
            notifier,
        }
    }
}

/// What a sustained stall leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallPolicy {
    /// Announce the blocked path and keep trying
    RetryForever,
    /// Announce, stop the base and fail
    AbortOnStall,
}

/// Which move is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// First move towards the target
    Coarse,
    /// Corrective second move; its completion ends the approach
    Fine,
}

/// State that moves the base to a target pose
pub struct ApproachPose {
    robot: Robot,
    config: ApproachConfig,
    monitor: MonitorConfig,
    messages: MessagesConfig,
    policy: StallPolicy,
}

impl ApproachPose {
    /// Creates a state with the given stall policy
    pub fn new(robot: Robot, policy: StallPolicy, config: &StatesConfig) -> Self {
        ApproachPose {
            robot,
            config: config.approach.clone(),
            monitor: config.monitor.clone(),
            messages: config.messages.clone(),
            policy,
        }
    }

    /// State that tries forever to reach the pose
    pub fn retrying(robot: Robot, config: &StatesConfig) -> Self {
        Self::new(robot, StallPolicy::RetryForever, config)
    }

    /// State that gives up once the base has been stuck for too long
    pub fn without_retry(robot: Robot, config: &StatesConfig) -> Self {
        Self::new(robot, StallPolicy::AbortOnStall, config)
    }

    /// Fixes the target, overriding whatever the userdata provides
    pub fn with_pose(mut self, pose: impl Into<PoseDescriptor>) -> Self {
        self.config.pose = Some(pose.into());
        self
    }

    /// Stall policy of this state
    pub fn policy(&self) -> StallPolicy {
        self.policy
    }

    /// Picks the target: configured pose first, then userdata `base_pose`
    pub fn resolve_target(&self, userdata: &UserData) -> Result<PoseDescriptor, PoseError> {
        if let Some(pose) = &self.config.pose {
            return Ok(pose.clone());
        }
        let value = userdata
            .get(BASE_POSE_KEY)
            .ok_or_else(|| PoseError::Missing(BASE_POSE_KEY.to_string()))?;
        PoseDescriptor::from_value(value)
    }

    /// Runs the move-and-monitor loop until the target is reached or,
    /// for [`StallPolicy::AbortOnStall`], the base is stuck.
    pub fn approach(&self, target: &PoseDescriptor) -> Outcome {
        let activity = ActivityFlag::new();
        // Released on every return path
        let _subscription = match self.robot.telemetry.subscribe(activity.clone()) {
            Ok(subscription) => subscription,
            Err(e) => {
                error!("Cannot monitor base motion: {}", e);
                return Outcome::Failed;
            }
        };

        let mode = self.config.mode.as_str();
        info!("Moving base to {} (mode '{}')", target, mode);
        let mut handle = self.robot.base.move_base(target, mode);
        let mut phase = if self.config.skip_fine_phase {
            Phase::Fine
        } else {
            Phase::Coarse
        };
        let mut idle_ticks: u32 = 0;

        loop {
            let status = handle.status();
            if status.is_complete() {
                match phase {
                    Phase::Coarse => {
                        // second move places the robot more exactly
                        info!("Coarse move to {} done, correcting", target);
                        handle = self.robot.base.move_base(target, mode);
                        phase = Phase::Fine;
                        continue;
                    }
                    Phase::Fine => {
                        info!("Base reached {}", target);
                        return Outcome::Succeeded;
                    }
                }
            }

            if status == MoveStatus::Failed && self.monitor.abort_on_move_failure {
                warn!("{:?} move to {} reported failure", phase, target);
                return Outcome::Failed;
            }

            if activity.take() {
                idle_ticks = 0;
            } else if idle_ticks > self.monitor.stall_threshold {
                match self.policy {
                    StallPolicy::RetryForever => {
                        warn!("Base idle for {} ticks, still trying to reach {}", idle_ticks, target);
                        self.robot.notifier.say(&self.messages.stalled, false);
                        idle_ticks = 0;
                    }
                    StallPolicy::AbortOnStall => {
                        warn!("Base idle for {} ticks, aborting approach to {}", idle_ticks, target);
                        self.robot.notifier.say(&self.messages.abort, false);
                        if let Err(e) = self.robot.base.stop() {
                            error!("Stopping the base failed: {}", e);
                        }
                        return Outcome::Failed;
                    }
                }
            } else {
                idle_ticks += 1;
            }

            debug!("{:?} move {:?}, idle ticks {}", phase, status, idle_ticks);
            thread::sleep(self.monitor.tick());
        }
    }
}

impl State for ApproachPose {
    fn outcomes(&self) -> &'static [&'static str] {
        OUTCOMES
    }

    fn input_keys(&self) -> &'static [&'static str] {
        INPUT_KEYS
    }

    fn execute(&mut self, userdata: &UserData) -> Outcome {
        match self.resolve_target(userdata) {
            Ok(target) => self.approach(&target),
            Err(e) => {
                error!("Invalid userdata 'pose': {}", e);
                Outcome::Failed
            }
        }
    }
}
