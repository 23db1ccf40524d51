//! Tabular softmax policies
//!
//! A [`PolicyTable`] holds one row of logits per discrete state. Action
//! selection draws a single uniform variate and walks the cumulative softmax
//! distribution of the state's row.

use ndarray::{Array2, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

use evolve_rl_core::{Action, RLError, RandomSource, Result, State};

/// Softmax of `logits`, shifted by the row maximum for stability
#[must_use]
pub fn softmax(logits: ArrayView1<'_, f64>) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&x| (x - max).exp()).collect();
    let denominator: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / denominator).collect()
}

/// Smallest action whose cumulative probability reaches `u`.
///
/// Rounding can leave the total mass just below `u`; the last action is
/// returned in that case.
pub fn sample_index(probabilities: &[f64], u: f64) -> Result<Action> {
    if probabilities.is_empty() {
        return Err(RLError::NoActions);
    }
    let mut sum = 0.0;
    for (a, p) in probabilities.iter().enumerate() {
        sum += p;
        if u <= sum {
            return Ok(a);
        }
    }
    Ok(probabilities.len() - 1)
}

/// `num_states × num_actions` table of action preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyTable {
    theta: Array2<f64>,
}

impl PolicyTable {
    /// Table filled with `initial_value`
    #[must_use]
    pub fn new(num_states: usize, num_actions: usize, initial_value: f64) -> Self {
        Self {
            theta: Array2::from_elem((num_states, num_actions), initial_value),
        }
    }

    /// Number of states (rows)
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.theta.nrows()
    }

    /// Number of actions (columns)
    #[must_use]
    pub fn num_actions(&self) -> usize {
        self.theta.ncols()
    }

    /// Underlying array
    #[must_use]
    pub fn as_array(&self) -> &Array2<f64> {
        &self.theta
    }

    /// Value at `(state, action)`
    #[must_use]
    pub fn get(&self, state: usize, action: Action) -> f64 {
        self.theta[[state, action]]
    }

    /// Mutable value at `(state, action)`
    pub fn get_mut(&mut self, state: usize, action: Action) -> &mut f64 {
        &mut self.theta[[state, action]]
    }

    /// Overwrite every entry
    pub fn fill(&mut self, value: f64) {
        self.theta.fill(value);
    }

    /// Copy all entries from `other` (same shape)
    pub fn assign(&mut self, other: &Self) {
        self.theta.assign(&other.theta);
    }

    /// Add an independent `U[-width, width)` offset to every entry
    pub fn perturb(&mut self, width: f64, rng: &RandomSource) {
        self.theta
            .iter_mut()
            .for_each(|x| *x += rng.uniform(-width, width));
    }

    /// Element-wise `self += scale * other`
    pub fn scaled_add(&mut self, scale: f64, other: &Array2<f64>) {
        Zip::from(&mut self.theta)
            .and(other)
            .for_each(|x, &g| *x += scale * g);
    }

    /// Decode `state` and check it addresses a row of this table
    pub fn row_index(&self, state: &State) -> Result<usize> {
        let s = state.index()?;
        if s >= self.num_states() {
            return Err(RLError::IndexOutOfCapacity {
                index: s,
                capacity: self.num_states(),
            });
        }
        Ok(s)
    }

    /// Softmax action distribution of row `state`, with logits divided by `temperature`
    #[must_use]
    pub fn probabilities(&self, state: usize, temperature: f64) -> Vec<f64> {
        let row = self.theta.row(state);
        if (temperature - 1.0).abs() < f64::EPSILON {
            softmax(row)
        } else {
            let scaled = row.mapv(|x| x / temperature);
            softmax(scaled.view())
        }
    }

    /// Sample an action for the one-hot `state`
    pub fn sample_action(&self, state: &State, temperature: f64, rng: &RandomSource) -> Result<Action> {
        let s = self.row_index(state)?;
        if self.num_actions() == 0 {
            return Err(RLError::NoActions);
        }
        let probabilities = self.probabilities(s, temperature);
        sample_index(&probabilities, rng.float64())
    }
}
