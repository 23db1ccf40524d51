//! Serializable agent selection

use serde::{Deserialize, Serialize};

use evolve_rl_core::{Agent, Result};

use crate::{BboConfig, Reinforce, ReinforceConfig, Sarsa, SarsaConfig, TabularBbo};

/// Which algorithm to run, with its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum AgentConfig {
    /// Temporal-difference controller
    Sarsa(SarsaConfig),
    /// Monte-Carlo policy gradient
    Reinforce(ReinforceConfig),
    /// Episodic black-box hill climbing
    Bbo(BboConfig),
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::Bbo(BboConfig::default())
    }
}

impl AgentConfig {
    /// Algorithm name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sarsa(_) => "sarsa",
            Self::Reinforce(_) => "reinforce",
            Self::Bbo(_) => "bbo",
        }
    }

    /// Build a fresh agent for an environment of the given shape.
    ///
    /// `max_episodes` fills in the BBO episode horizon when the config leaves
    /// it unset.
    pub fn build(
        &self,
        num_states: usize,
        num_actions: usize,
        gamma: f64,
        max_episodes: usize,
    ) -> Result<Box<dyn Agent>> {
        Ok(match self {
            Self::Sarsa(config) => Box::new(Sarsa::new(
                config.clone(),
                num_states,
                num_actions,
                gamma,
            )?),
            Self::Reinforce(config) => Box::new(Reinforce::new(
                config.clone(),
                num_states,
                num_actions,
                gamma,
            )?),
            Self::Bbo(config) => {
                let mut config = config.clone();
                config.max_episodes.get_or_insert(max_episodes);
                Box::new(TabularBbo::new(config, num_states, num_actions, gamma)?)
            }
        })
    }
}
