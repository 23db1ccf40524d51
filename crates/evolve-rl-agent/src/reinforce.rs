//! Tabular REINFORCE (Monte-Carlo policy gradient)

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use evolve_rl_core::{Action, Agent, RandomSource, Result, State, UpdateTiming};

use crate::policy::PolicyTable;
use crate::tracker::EpisodeTracker;

/// REINFORCE configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinforceConfig {
    /// Step size
    pub alpha: f64,
}

impl Default for ReinforceConfig {
    fn default() -> Self {
        Self { alpha: 0.01 }
    }
}

/// Softmax policy-gradient learner updating after every episode
#[derive(Debug, Clone)]
pub struct Reinforce {
    config: ReinforceConfig,
    gamma: f64,
    theta: PolicyTable,
    tracker: EpisodeTracker,
}

impl Reinforce {
    /// Create a new REINFORCE agent
    pub fn new(
        config: ReinforceConfig,
        num_states: usize,
        num_actions: usize,
        gamma: f64,
    ) -> Result<Self> {
        Ok(Self {
            config,
            gamma,
            theta: PolicyTable::new(num_states, num_actions, 0.0),
            tracker: EpisodeTracker::new(1)?,
        })
    }

    /// Current policy logits
    #[must_use]
    pub fn policy(&self) -> &PolicyTable {
        &self.theta
    }

    /// Gradient estimate for the buffered episode against the current policy.
    ///
    /// The `gamma^t` factor on each term is dropped, as most practical
    /// implementations do.
    fn gradient_estimate(&self) -> Result<Array2<f64>> {
        let mut gradient = Array2::zeros(self.theta.as_array().raw_dim());

        for episode in self.tracker.episodes() {
            let returns = episode.returns_to_go(self.gamma);
            for (step, g) in episode.steps().iter().zip(returns) {
                let s = self.theta.row_index(&step.state)?;
                let pi = self.theta.probabilities(s, 1.0);
                for (a_prime, p) in pi.iter().enumerate() {
                    let indicator = if a_prime == step.action { 1.0 } else { 0.0 };
                    gradient[[s, a_prime]] += g * (indicator - p);
                }
            }
        }

        Ok(gradient)
    }

    fn episodic_update(&mut self) -> Result<()> {
        let gradient = self.gradient_estimate()?;
        self.theta.scaled_add(self.config.alpha, &gradient);
        trace!(
            steps = self.tracker.episodes().iter().map(|e| e.len()).sum::<usize>(),
            "reinforce update applied"
        );
        self.tracker.wipe();
        Ok(())
    }
}

impl Agent for Reinforce {
    fn name(&self) -> &'static str {
        "reinforce"
    }

    fn update_timing(&self) -> UpdateTiming {
        UpdateTiming::AfterNextAction
    }

    fn is_episodic(&self) -> bool {
        true
    }

    fn get_action(&mut self, state: &State, rng: &RandomSource) -> Result<Action> {
        self.theta.sample_action(state, 1.0, rng)
    }

    fn reset(&mut self, _rng: &RandomSource) {
        self.theta.fill(0.0);
        self.tracker.wipe();
    }

    fn update_sarsa(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        _next_state: &State,
        _next_action: Action,
        _rng: &RandomSource,
    ) -> Result<()> {
        self.tracker.update(state, action, reward)
    }

    fn last_update(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        _rng: &RandomSource,
    ) -> Result<()> {
        if self.tracker.last_update(state, action, reward)? {
            self.episodic_update()?;
        }
        Ok(())
    }
}
