//! Environments for evolve-rl
//!
//! This crate provides the stochastic [`Gridworld`] benchmark and a
//! name-based registry used by the trial runner to build a fresh
//! environment for every trial.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod gridworld;
pub mod registry;

// Re-export environments
pub use gridworld::{Cell, Gridworld, GridworldConfig};
pub use registry::{list_envs, make_env, register_env, EnvConstructor, EnvRegistry};

// Re-export core types
pub use evolve_rl_core::{Action, Environment, State};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{make_env, EnvRegistry, Gridworld, GridworldConfig};
    pub use evolve_rl_core::prelude::*;
}
