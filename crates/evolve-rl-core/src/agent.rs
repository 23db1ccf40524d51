//! Agent capability trait

use serde::{Deserialize, Serialize};

use crate::{RLError, RandomSource, Result, State};

/// Discrete action index in `[0, num_actions)`
pub type Action = usize;

/// When an agent learns from a non-terminal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateTiming {
    /// Learn from `(s, a, r, s')` before the next action is chosen
    BeforeNextAction,
    /// Choose `a'` first, then learn from `(s, a, r, s', a')`
    AfterNextAction,
}

/// Learning agent driven by the episode runner.
///
/// An agent declares exactly one [`UpdateTiming`]. The runner only calls the
/// hook that matches it; the default hook bodies report the mismatch as
/// [`RLError::UnsupportedUpdate`].
pub trait Agent: Send {
    /// Short algorithm name used in logs and errors
    fn name(&self) -> &'static str;

    /// Declared update timing
    fn update_timing(&self) -> UpdateTiming;

    /// Whether updates happen before the next action is chosen
    fn update_before_next_action(&self) -> bool {
        self.update_timing() == UpdateTiming::BeforeNextAction
    }

    /// Whether the agent learns at episode boundaries
    fn is_episodic(&self) -> bool {
        false
    }

    /// Select an action for `state`
    fn get_action(&mut self, state: &State, rng: &RandomSource) -> Result<Action>;

    /// Notification that a new episode starts
    fn new_episode(&mut self) {}

    /// Return to a blank slate prior to learning
    fn reset(&mut self, rng: &RandomSource);

    /// Learn from `(s, a, r, s')`
    fn update_sars(
        &mut self,
        _state: &State,
        _action: Action,
        _reward: f64,
        _next_state: &State,
        _rng: &RandomSource,
    ) -> Result<()> {
        Err(RLError::UnsupportedUpdate {
            agent: self.name(),
            hook: "update_sars",
        })
    }

    /// Learn from `(s, a, r, s', a')`
    fn update_sarsa(
        &mut self,
        _state: &State,
        _action: Action,
        _reward: f64,
        _next_state: &State,
        _next_action: Action,
        _rng: &RandomSource,
    ) -> Result<()> {
        Err(RLError::UnsupportedUpdate {
            agent: self.name(),
            hook: "update_sarsa",
        })
    }

    /// Learn from the final transition, whose successor is the terminal absorbing state
    fn last_update(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        rng: &RandomSource,
    ) -> Result<()>;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn update_timing(&self) -> UpdateTiming {
        (**self).update_timing()
    }

    fn is_episodic(&self) -> bool {
        (**self).is_episodic()
    }

    fn get_action(&mut self, state: &State, rng: &RandomSource) -> Result<Action> {
        (**self).get_action(state, rng)
    }

    fn new_episode(&mut self) {
        (**self).new_episode();
    }

    fn reset(&mut self, rng: &RandomSource) {
        (**self).reset(rng);
    }

    fn update_sars(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        next_state: &State,
        rng: &RandomSource,
    ) -> Result<()> {
        (**self).update_sars(state, action, reward, next_state, rng)
    }

    fn update_sarsa(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        next_state: &State,
        next_action: Action,
        rng: &RandomSource,
    ) -> Result<()> {
        (**self).update_sarsa(state, action, reward, next_state, next_action, rng)
    }

    fn last_update(
        &mut self,
        state: &State,
        action: Action,
        reward: f64,
        rng: &RandomSource,
    ) -> Result<()> {
        (**self).last_update(state, action, reward, rng)
    }
}
