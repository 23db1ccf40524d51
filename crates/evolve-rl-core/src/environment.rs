//! Environment capability trait

use crate::{Action, RandomSource, Result, State};

/// Stateful episodic environment over a finite state and action set
pub trait Environment: Send {
    /// How many episodes a trial should run
    fn max_episodes(&self) -> usize;

    /// Length of state vectors
    fn state_dim(&self) -> usize;

    /// Size of the action set
    fn num_actions(&self) -> usize;

    /// Discount factor
    fn gamma(&self) -> f64;

    /// Apply `action`, mutate internal state and return the reward
    fn transition(&mut self, action: Action, rng: &RandomSource) -> Result<f64>;

    /// Current state. Fails in the terminal absorbing state.
    fn state(&self) -> Result<State>;

    /// Whether the episode has ended
    fn in_terminal_absorbing_state(&self) -> bool;

    /// Sample a fresh initial state and clear the terminal flag
    fn new_episode(&mut self, rng: &RandomSource);
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn max_episodes(&self) -> usize {
        (**self).max_episodes()
    }

    fn state_dim(&self) -> usize {
        (**self).state_dim()
    }

    fn num_actions(&self) -> usize {
        (**self).num_actions()
    }

    fn gamma(&self) -> f64 {
        (**self).gamma()
    }

    fn transition(&mut self, action: Action, rng: &RandomSource) -> Result<f64> {
        (**self).transition(action, rng)
    }

    fn state(&self) -> Result<State> {
        (**self).state()
    }

    fn in_terminal_absorbing_state(&self) -> bool {
        (**self).in_terminal_absorbing_state()
    }

    fn new_episode(&mut self, rng: &RandomSource) {
        (**self).new_episode(rng);
    }
}
