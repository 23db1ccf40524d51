//! Tabular SARSA (temporal-difference control)

use serde::{Deserialize, Serialize};

use evolve_rl_core::{Action, Agent, RLError, RandomSource, Result, State, UpdateTiming};

use crate::policy::PolicyTable;

/// SARSA configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SarsaConfig {
    /// Step size
    pub alpha: f64,
    /// Initial action value for every state-action pair
    pub initial_value: f64,
    /// Softmax temperature over action values
    pub temperature: f64,
}

impl Default for SarsaConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            initial_value: 0.0,
            temperature: 1.0,
        }
    }
}

impl SarsaConfig {
    /// Check the configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(RLError::Config(format!(
                "temperature must be positive and finite, got {}",
                self.temperature
            )));
        }
        if !self.alpha.is_finite() {
            return Err(RLError::Config(format!(
                "alpha must be finite, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// On-policy TD controller with softmax action selection over `Q`
#[derive(Debug, Clone)]
pub struct Sarsa {
    config: SarsaConfig,
    gamma: f64,
    q: PolicyTable,
}

impl Sarsa {
    /// Create a new SARSA agent
    pub fn new(config: SarsaConfig, num_states: usize, num_actions: usize, gamma: f64) -> Result<Self> {
        config.validate()?;
        let q = PolicyTable::new(num_states, num_actions, config.initial_value);
        Ok(Self { config, gamma, q })
    }

    /// Current action-value table
    #[must_use]
    pub fn q_values(&self) -> &PolicyTable {
        &self.q
    }

    /// Discount used in the TD target
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Agent for Sarsa {
    fn name(&self) -> &'static str {
        "sarsa"
    }

    fn update_timing(&self) -> UpdateTiming {
        UpdateTiming::AfterNextAction
    }

    fn get_action(&mut self, state: &State, rng: &RandomSource) -> Result<Action> {
        self.q.sample_action(state, self.config.temperature, rng)
    }

    fn reset(&mut self, _rng: &RandomSource) {
        self.q.fill(self.config.initial_value);
    }

    fn update_sarsa(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        next_state: &State,
        next_action: Action,
        _rng: &RandomSource,
    ) -> Result<()> {
        let s = self.q.row_index(state)?;
        let s_prime = self.q.row_index(next_state)?;
        let td_error = reward + self.gamma * self.q.get(s_prime, next_action) - self.q.get(s, action);
        *self.q.get_mut(s, action) += self.config.alpha * td_error;
        Ok(())
    }

    fn last_update(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        _rng: &RandomSource,
    ) -> Result<()> {
        let s = self.q.row_index(state)?;
        let td_error = reward - self.q.get(s, action);
        *self.q.get_mut(s, action) += self.config.alpha * td_error;
        Ok(())
    }
}
