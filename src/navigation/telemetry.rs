// src/navigation/telemetry.rs
// Motion telemetry: a subscription that flags whether the base reported odometry.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Liveness signal set by the telemetry delivery context.
///
/// Cloning shares the underlying flag. One writer (the subscription) and one
/// reader (the polling loop) per approach invocation.
#[derive(Debug, Clone, Default)]
pub struct ActivityFlag(Arc<AtomicBool>);

impl ActivityFlag {
    /// Creates a cleared flag.
    pub fn new() -> Self {
        ActivityFlag::default()
    }

    /// Records that a motion event was observed.
    pub fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns whether activity was observed since the last call and clears the flag.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Reads the flag without clearing it.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Source of motion events for the base.
#[cfg_attr(test, mockall::automock)]
pub trait MotionTelemetry: Send + Sync {
    /// Registers `flag` to be marked on every odometry message until the
    /// returned guard is dropped.
    fn subscribe(&self, flag: ActivityFlag) -> Result<Subscription, TelemetryError>;
}

/// Guard for a live telemetry subscription; unsubscribes on drop.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps the action that tears the subscription down.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            release: Some(Box::new(release)),
        }
    }

    /// Subscription with nothing to release.
    pub fn detached() -> Self {
        Subscription { release: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Telemetry subscription errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryError {
    /// Topic could not be subscribed
    SubscribeFailed(String),
    /// Telemetry source is shut down
    Closed,
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TelemetryError::SubscribeFailed(msg) => write!(f, "subscribe failed: {}", msg),
            TelemetryError::Closed => write!(f, "telemetry source closed"),
        }
    }
}

impl std::error::Error for TelemetryError {}
