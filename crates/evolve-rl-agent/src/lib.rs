//! Tabular reinforcement learning agents for evolve-rl
//!
//! This crate provides three interchangeable agents that satisfy the
//! [`evolve_rl_core::Agent`] contract:
//! - SARSA, a temporal-difference controller
//! - REINFORCE, a Monte-Carlo policy-gradient controller
//! - Tabular BBO, an episodic black-box hill climber

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bbo;
pub mod config;
pub mod policy;
pub mod reinforce;
pub mod sarsa;
pub mod tracker;

// Re-export agents
pub use bbo::{BatchOutcome, BboConfig, TabularBbo};
pub use config::AgentConfig;
pub use reinforce::{Reinforce, ReinforceConfig};
pub use sarsa::{Sarsa, SarsaConfig};

// Re-export utilities
pub use policy::{sample_index, softmax, PolicyTable};
pub use tracker::EpisodeTracker;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AgentConfig, BboConfig, Reinforce, Sarsa, TabularBbo};
    pub use evolve_rl_core::prelude::*;
}
