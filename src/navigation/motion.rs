// src/navigation/motion.rs
// Contracts of the robot-command façade the approach states drive.
// Implementations live outside this crate (or in `sim` for testing).

use super::pose::PoseDescriptor;

/// Status of a single non-blocking move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// Accepted but not started
    Pending,
    /// Base is executing the move
    Running,
    /// Target reached
    Succeeded,
    /// Move aborted, rejected or preempted
    Failed,
}

impl MoveStatus {
    /// Whether the move reached its target.
    pub fn is_complete(self) -> bool {
        self == MoveStatus::Succeeded
    }
}

/// Handle returned by [`MotionFacade::move_base`].
#[cfg_attr(test, mockall::automock)]
pub trait MoveHandle: Send {
    /// Polls the current status without blocking.
    fn status(&self) -> MoveStatus;
}

/// Robot-command façade for the mobile base.
#[cfg_attr(test, mockall::automock)]
pub trait MotionFacade: Send + Sync {
    /// Starts a non-blocking move of the base towards `target` using the
    /// motion profile `mode`.
    fn move_base(&self, target: &PoseDescriptor, mode: &str) -> Box<dyn MoveHandle>;

    /// Stops the base.
    fn stop(&self) -> Result<(), MotionError>;
}

/// User-facing notices (speech or display).
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    /// Fire-and-forget; never fails observably.
    fn say(&self, message: &str, blocking: bool);
}

/// Notification sink that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn say(&self, message: &str, _blocking: bool) {
        log::info!("say: {}", message);
    }
}

/// Errors reported by a motion façade.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Command service could not be reached
    Unavailable(String),
    /// Command was delivered but rejected
    Rejected(String),
}

impl std::fmt::Display for MotionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MotionError::Unavailable(msg) => write!(f, "motion service unavailable: {}", msg),
            MotionError::Rejected(msg) => write!(f, "motion command rejected: {}", msg),
        }
    }
}

impl std::error::Error for MotionError {}
