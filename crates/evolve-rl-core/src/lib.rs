//! Core reinforcement learning traits and types for evolve-rl
//!
//! This crate defines the agent/environment interaction protocol, the
//! one-hot state encoding, per-episode trajectories and the shared random
//! source used by every trial.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod environment;
pub mod error;
pub mod random;
pub mod runner;
pub mod state;
pub mod trajectory;

// Re-export core traits and types
pub use agent::{Action, Agent, UpdateTiming};
pub use environment::Environment;
pub use error::{RLError, Result};
pub use random::RandomSource;
pub use runner::{run_agent_environment, run_episode};
pub use state::{from_one_hot, to_one_hot, State};
pub use trajectory::{Step, Trajectory};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, Agent, Environment, RLError, RandomSource, Result, State, Trajectory,
        UpdateTiming,
    };
}
