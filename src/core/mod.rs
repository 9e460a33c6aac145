// core/mod.rs

// Declares the executor-facing contract shared by every state in the crate.

pub mod state;

pub use state::{Outcome, State, UserData};
