//! Per-episode trajectory storage

use serde::{Deserialize, Serialize};

use crate::{Action, State};

/// Single (state, action, reward) step in a trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// State the action was taken in
    pub state: State,
    /// Action taken
    pub action: Action,
    /// Reward received
    pub reward: f64,
}

/// Ordered steps of one episode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    steps: Vec<Step>,
}

impl Trajectory {
    /// Create a new empty trajectory
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step
    pub fn push(&mut self, state: State, action: Action, reward: f64) {
        self.steps.push(Step {
            state,
            action,
            reward,
        });
    }

    /// Get the length of the trajectory
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if trajectory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps in order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Drop all steps
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// `Σ gamma^t * r_t`, recomputed from the raw rewards
    #[must_use]
    pub fn discounted_return(&self, gamma: f64) -> f64 {
        let mut total = 0.0;
        let mut discount = 1.0;
        for step in &self.steps {
            total += discount * step.reward;
            discount *= gamma;
        }
        total
    }

    /// Discounted return-to-go `G_t` for every step
    #[must_use]
    pub fn returns_to_go(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut running_return = 0.0;

        for i in (0..self.len()).rev() {
            running_return = self.steps[i].reward + gamma * running_return;
            returns[i] = running_return;
        }

        returns
    }
}
