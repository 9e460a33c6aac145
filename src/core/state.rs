// core/state.rs

// Contract between the states in this crate and the external state-machine
// executor: outcomes, userdata blackboard and the `State` trait itself.

use serde_yaml::Value;
use std::collections::HashMap;

// Result of executing a state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

impl Outcome {
    /// Outcome label as registered with the executor
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Keyed values passed between states by the executor
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserData {
    entries: HashMap<String, Value>,
}

impl UserData {
    pub fn new() -> Self {
        UserData::default()
    }

    /// Stores `value` under `key`, replacing any previous entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Parses a YAML mapping into userdata (keys must be strings)
    pub fn from_yaml(src: &str) -> Result<Self, serde_yaml::Error> {
        let entries: HashMap<String, Value> = serde_yaml::from_str(src)?;
        Ok(UserData { entries })
    }
}

// A state runnable by the executor
pub trait State {
    /// Outcome labels this state may return
    fn outcomes(&self) -> &'static [&'static str];

    /// Userdata keys read by `execute`
    fn input_keys(&self) -> &'static [&'static str];

    /// Runs the state to completion
    fn execute(&mut self, userdata: &UserData) -> Outcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userdata_from_yaml() {
        let data = UserData::from_yaml("base_pose: [1.0, 2.0, 0.0]\nlabel: home").unwrap();
        assert!(data.get("base_pose").unwrap().is_sequence());
        assert_eq!(data.get("label").and_then(Value::as_str), Some("home"));
        assert!(data.get("missing").is_none());
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::Succeeded.to_string(), "succeeded");
        assert_eq!(Outcome::Failed.as_str(), "failed");
    }
}
