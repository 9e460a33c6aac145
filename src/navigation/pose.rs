// src/navigation/pose.rs
// Movement targets for the approach states: named waypoints or (x, y, theta) triples.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Planar base pose in the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Pose2D {
    /// X position (meters)
    pub x: f64,
    /// Y position (meters)
    pub y: f64,
    /// Orientation (radians)
    pub theta: f64,
}

impl Pose2D {
    /// Creates a pose from its components.
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose2D { x, y, theta }
    }

    /// Position part of the pose as a vector.
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose2D) -> f64 {
        (other.position() - self.position()).norm()
    }
}

impl From<[f64; 3]> for Pose2D {
    fn from([x, y, theta]: [f64; 3]) -> Self {
        Pose2D { x, y, theta }
    }
}

impl From<Pose2D> for [f64; 3] {
    fn from(pose: Pose2D) -> Self {
        [pose.x, pose.y, pose.theta]
    }
}

/// Target handed to the motion façade.
///
/// A descriptor is always exactly one of the two shapes; anything else is
/// rejected by [`PoseDescriptor::from_value`] before a move is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoseDescriptor {
    /// Waypoint name, resolved by the façade
    Named(String),
    /// Explicit coordinates
    Coordinates(Pose2D),
}

impl PoseDescriptor {
    /// Normalizes a loosely typed value (as found in state userdata).
    ///
    /// Strings pass through unchanged. A sequence of exactly three numbers
    /// becomes a coordinate triple. Everything else is an error.
    pub fn from_value(value: &Value) -> Result<Self, PoseError> {
        match value {
            Value::String(name) => Ok(PoseDescriptor::Named(name.clone())),
            Value::Sequence(items) => {
                if items.len() != 3 {
                    return Err(PoseError::WrongLength(items.len()));
                }
                let mut coords = [0.0; 3];
                for (slot, item) in coords.iter_mut().zip(items) {
                    *slot = item
                        .as_f64()
                        .ok_or_else(|| PoseError::NotANumber(describe(item)))?;
                }
                Ok(PoseDescriptor::Coordinates(coords.into()))
            }
            Value::Tagged(tagged) => Self::from_value(&tagged.value),
            other => Err(PoseError::UnsupportedShape(describe(other))),
        }
    }
}

impl From<&str> for PoseDescriptor {
    fn from(name: &str) -> Self {
        PoseDescriptor::Named(name.to_string())
    }
}

impl From<Pose2D> for PoseDescriptor {
    fn from(pose: Pose2D) -> Self {
        PoseDescriptor::Coordinates(pose)
    }
}

impl std::fmt::Display for PoseDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PoseDescriptor::Named(name) => write!(f, "'{}'", name),
            PoseDescriptor::Coordinates(p) => write!(f, "[{}, {}, {}]", p.x, p.y, p.theta),
        }
    }
}

// Short rendering of a rejected value for log messages.
fn describe(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}

/// Reasons a target could not be turned into a [`PoseDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub enum PoseError {
    /// No configured pose and nothing under the userdata key
    Missing(String),
    /// Neither a string nor a coordinate list
    UnsupportedShape(String),
    /// Coordinate list with the wrong number of elements
    WrongLength(usize),
    /// Coordinate list containing a non-numeric element
    NotANumber(String),
}

impl std::fmt::Display for PoseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            PoseError::Missing(key) => write!(f, "no target pose configured and userdata '{}' is missing", key),
            PoseError::UnsupportedShape(v) => write!(f, "unsupported pose value: {}", v),
            PoseError::WrongLength(n) => write!(f, "coordinate pose needs 3 elements, got {}", n),
            PoseError::NotANumber(v) => write!(f, "coordinate element is not a number: {}", v),
        }
    }
}

impl std::error::Error for PoseError {}
