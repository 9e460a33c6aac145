//! Simulated mobile base
//!
//! In-process stand-in for the robot-command façade and its odometry feed,
//! used by the demo binary and the integration tests. A background thread
//! drives the base towards the active goal at a fixed rate and publishes an
//! odometry event to every subscriber on each step in which the base moved.

use crate::navigation::{
    ActivityFlag, MotionError, MotionFacade, MotionTelemetry, MoveHandle, MoveStatus, Pose2D,
    PoseDescriptor, Subscription, TelemetryError,
};
use log::{debug, info, warn};
use nalgebra::UnitComplex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Simulated base parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Named waypoints the façade can resolve
    pub waypoints: BTreeMap<String, Pose2D>,
    /// Pose at start-up
    pub start: Pose2D,
    /// Linear speed (m/s)
    pub speed: f64,
    /// Turn rate (rad/s)
    pub turn_rate: f64,
    /// Distance and heading error at which a move counts as done
    pub goal_tolerance: f64,
    /// Simulation step and odometry period (milliseconds)
    pub odometry_period_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        let mut waypoints = BTreeMap::new();
        waypoints.insert("home".to_string(), Pose2D::new(0.0, 0.0, 0.0));
        waypoints.insert("dock_station".to_string(), Pose2D::new(1.0, 0.5, 0.0));
        waypoints.insert("kitchen".to_string(), Pose2D::new(3.0, 2.0, 1.57));
        SimConfig {
            waypoints,
            start: Pose2D::new(0.0, 0.0, 0.0),
            speed: 0.5,
            turn_rate: 1.0,
            goal_tolerance: 0.01,
            odometry_period_ms: 20,
        }
    }
}

struct Goal {
    target: Pose2D,
    status: Arc<Mutex<MoveStatus>>,
}

struct SimState {
    pose: Pose2D,
    goal: Option<Goal>,
    blocked: bool,
    stop_fails: bool,
    listeners: Vec<(u64, ActivityFlag)>,
    next_listener: u64,
}

struct Shared {
    config: SimConfig,
    state: Mutex<SimState>,
    running: AtomicBool,
    moves: AtomicUsize,
    stops: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_status(status: &Mutex<MoveStatus>, value: MoveStatus) {
    *lock(status) = value;
}

impl Shared {
    // Advances the base by one period of `dt` seconds.
    fn step(&self, dt: f64) {
        let mut state = lock(&self.state);
        if state.blocked {
            return;
        }
        let Some(goal) = state.goal.as_ref() else {
            return;
        };
        let target = goal.target;
        let status = goal.status.clone();
        set_status(&status, MoveStatus::Running);

        let offset = target.position() - state.pose.position();
        let distance = offset.norm();
        let reach = self.config.speed * dt;
        let position = if distance > reach {
            state.pose.position() + offset * (reach / distance)
        } else {
            target.position()
        };

        let heading = UnitComplex::new(state.pose.theta);
        let error = heading.angle_to(&UnitComplex::new(target.theta));
        let turn = error.clamp(-self.config.turn_rate * dt, self.config.turn_rate * dt);
        let theta = (heading * UnitComplex::new(turn)).angle();

        state.pose = Pose2D::new(position.x, position.y, theta);
        for (_, flag) in &state.listeners {
            flag.mark();
        }

        let remaining = state.pose.distance_to(&target);
        let heading_error = UnitComplex::new(theta).angle_to(&UnitComplex::new(target.theta));
        if remaining <= self.config.goal_tolerance && heading_error.abs() <= self.config.goal_tolerance {
            debug!("Simulated base reached {:?}", target);
            set_status(&status, MoveStatus::Succeeded);
            state.goal = None;
        }
    }
}

/// Move handle tracking one simulated goal
pub struct SimMoveHandle {
    status: Arc<Mutex<MoveStatus>>,
}

impl MoveHandle for SimMoveHandle {
    fn status(&self) -> MoveStatus {
        *lock(&self.status)
    }
}

/// Simulated base acting as motion façade and telemetry source
pub struct SimulatedBase {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatedBase {
    /// Starts the simulation thread
    pub fn start(config: SimConfig) -> Self {
        let period = Duration::from_millis(config.odometry_period_ms.max(1));
        let shared = Arc::new(Shared {
            state: Mutex::new(SimState {
                pose: config.start,
                goal: None,
                blocked: false,
                stop_fails: false,
                listeners: Vec::new(),
                next_listener: 0,
            }),
            config,
            running: AtomicBool::new(true),
            moves: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        });

        let worker_shared = shared.clone();
        let worker = thread::spawn(move || {
            let dt = period.as_secs_f64();
            while worker_shared.running.load(Ordering::Acquire) {
                thread::sleep(period);
                worker_shared.step(dt);
            }
        });
        info!("Simulated base started ({} ms period)", period.as_millis());

        SimulatedBase {
            shared,
            worker: Some(worker),
        }
    }

    /// Current pose of the base
    pub fn pose(&self) -> Pose2D {
        lock(&self.shared.state).pose
    }

    /// Blocks or frees the path; a blocked base neither moves nor reports odometry
    pub fn set_blocked(&self, blocked: bool) {
        lock(&self.shared.state).blocked = blocked;
    }

    /// Makes subsequent stop commands fail
    pub fn set_stop_fails(&self, fails: bool) {
        lock(&self.shared.state).stop_fails = fails;
    }

    /// Number of move commands received
    pub fn move_count(&self) -> usize {
        self.shared.moves.load(Ordering::SeqCst)
    }

    /// Number of stop commands received
    pub fn stop_count(&self) -> usize {
        self.shared.stops.load(Ordering::SeqCst)
    }

    /// Number of live telemetry subscriptions
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.state).listeners.len()
    }

    fn resolve(&self, target: &PoseDescriptor) -> Option<Pose2D> {
        match target {
            PoseDescriptor::Named(name) => self.shared.config.waypoints.get(name).copied(),
            PoseDescriptor::Coordinates(pose) => Some(*pose),
        }
    }
}

impl MotionFacade for SimulatedBase {
    fn move_base(&self, target: &PoseDescriptor, mode: &str) -> Box<dyn MoveHandle> {
        self.shared.moves.fetch_add(1, Ordering::SeqCst);
        let Some(pose) = self.resolve(target) else {
            warn!("Unknown waypoint {}", target);
            return Box::new(SimMoveHandle {
                status: Arc::new(Mutex::new(MoveStatus::Failed)),
            });
        };

        debug!("Simulated move to {:?} (mode '{}')", pose, mode);
        let status = Arc::new(Mutex::new(MoveStatus::Pending));
        let mut state = lock(&self.shared.state);
        if let Some(previous) = state.goal.replace(Goal {
            target: pose,
            status: status.clone(),
        }) {
            set_status(&previous.status, MoveStatus::Failed);
        }
        Box::new(SimMoveHandle { status })
    }

    fn stop(&self) -> Result<(), MotionError> {
        self.shared.stops.fetch_add(1, Ordering::SeqCst);
        let mut state = lock(&self.shared.state);
        if state.stop_fails {
            return Err(MotionError::Unavailable("simulated stop failure".to_string()));
        }
        if let Some(goal) = state.goal.take() {
            set_status(&goal.status, MoveStatus::Failed);
        }
        Ok(())
    }
}

impl MotionTelemetry for SimulatedBase {
    fn subscribe(&self, flag: ActivityFlag) -> Result<Subscription, TelemetryError> {
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(TelemetryError::Closed);
        }
        let mut state = lock(&self.shared.state);
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.push((id, flag));

        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Ok(Subscription::new(move || {
            if let Some(shared) = shared.upgrade() {
                lock(&shared.state).listeners.retain(|(listener, _)| *listener != id);
            }
        }))
    }
}

impl Drop for SimulatedBase {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn fast() -> SimConfig {
        SimConfig {
            speed: 20.0,
            turn_rate: 50.0,
            odometry_period_ms: 1,
            ..SimConfig::default()
        }
    }

    fn wait_for(handle: &dyn MoveHandle, status: MoveStatus) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if handle.status() == status {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn moves_to_named_waypoint() {
        let base = SimulatedBase::start(fast());
        let handle = base.move_base(&"kitchen".into(), "omni");
        assert!(wait_for(handle.as_ref(), MoveStatus::Succeeded));
        let pose = base.pose();
        assert!(pose.distance_to(&Pose2D::new(3.0, 2.0, 1.57)) < 0.02);
        assert!((pose.theta - 1.57).abs() < 0.02);
    }

    #[test]
    fn unknown_waypoint_fails() {
        let base = SimulatedBase::start(fast());
        let handle = base.move_base(&"atlantis".into(), "omni");
        assert_eq!(handle.status(), MoveStatus::Failed);
        assert_eq!(base.move_count(), 1);
    }

    #[test]
    fn blocked_base_stays_put_and_is_silent() {
        let base = SimulatedBase::start(fast());
        base.set_blocked(true);
        let flag = ActivityFlag::new();
        let _sub = base.subscribe(flag.clone()).unwrap();
        let handle = base.move_base(&Pose2D::new(2.0, 0.0, 0.0).into(), "omni");
        thread::sleep(Duration::from_millis(30));
        assert!(!flag.is_set());
        assert_ne!(handle.status(), MoveStatus::Succeeded);
        assert_eq!(base.pose(), Pose2D::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn new_goal_preempts_previous() {
        let base = SimulatedBase::start(fast());
        base.set_blocked(true);
        let first = base.move_base(&"kitchen".into(), "omni");
        let _second = base.move_base(&"home".into(), "omni");
        assert_eq!(first.status(), MoveStatus::Failed);
    }

    #[test]
    fn stop_cancels_goal_and_can_fail() {
        let base = SimulatedBase::start(fast());
        base.set_blocked(true);
        let handle = base.move_base(&"kitchen".into(), "omni");
        assert!(base.stop().is_ok());
        assert_eq!(handle.status(), MoveStatus::Failed);
        base.set_stop_fails(true);
        assert!(base.stop().is_err());
        assert_eq!(base.stop_count(), 2);
    }

    #[test]
    fn subscription_is_removed_on_drop() {
        let base = SimulatedBase::start(fast());
        let sub = base.subscribe(ActivityFlag::new()).unwrap();
        assert_eq!(base.subscriber_count(), 1);
        drop(sub);
        assert_eq!(base.subscriber_count(), 0);
    }
}
