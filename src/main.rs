// src/main.rs
// Demo entry point: runs both approach states against the simulated base.
//
// Usage: generic_states [config.yaml]

use generic_states::sim::SimulatedBase;
use generic_states::{ApproachPose, LogNotifier, Robot, State, StatesConfig, UserData};
use log::info;
use std::error::Error;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging for debugging
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            StatesConfig::from_file(path)?
        }
        None => StatesConfig::default(),
    };

    let base = Arc::new(SimulatedBase::start(config.sim.clone()));
    let robot = Robot::new(base.clone(), base.clone(), Arc::new(LogNotifier));

    // Named waypoint, retrying state
    let mut userdata = UserData::new();
    userdata.insert("base_pose", "dock_station");
    let mut approach = ApproachPose::retrying(robot.clone(), &config);
    let outcome = approach.execute(&userdata);
    info!("approach_pose(dock_station) -> {} at {:?}", outcome, base.pose());

    // Coordinates with the path blocked: the bounded state gives up
    userdata.insert("base_pose", vec![2.0, 1.0, 0.0]);
    base.set_blocked(true);
    let mut bounded = ApproachPose::without_retry(robot, &config);
    let outcome = bounded.execute(&userdata);
    info!(
        "approach_pose_without_retry([2.0, 1.0, 0.0]) -> {} ({} moves, {} stops)",
        outcome,
        base.move_count(),
        base.stop_count()
    );

    Ok(())
}
