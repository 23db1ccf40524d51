//! Episode runner enforcing the agent/environment interaction protocol

use tracing::{debug, trace};

use crate::{Agent, Environment, RandomSource, Result, UpdateTiming};

/// Run one episode to termination and return its discounted return.
///
/// The environment and agent are told about the new episode first. Each
/// transition calls exactly one learning hook: `last_update` on entering the
/// terminal absorbing state, otherwise `update_sars` or `update_sarsa`
/// according to the agent's declared [`UpdateTiming`].
pub fn run_episode<A, E>(agent: &mut A, env: &mut E, gamma: f64, rng: &RandomSource) -> Result<f64>
where
    A: Agent + ?Sized,
    E: Environment + ?Sized,
{
    env.new_episode(rng);
    agent.new_episode();

    let timing = agent.update_timing();
    let mut result = 0.0;
    let mut discount = 1.0;
    let mut state = env.state()?;
    let mut action = agent.get_action(&state, rng)?;
    let mut steps = 0usize;

    loop {
        let reward = env.transition(action, rng)?;
        result += discount * reward;
        discount *= gamma;
        steps += 1;

        if env.in_terminal_absorbing_state() {
            agent.last_update(&state, action, reward, rng)?;
            break;
        }

        let next_state = env.state()?;
        let next_action = match timing {
            UpdateTiming::BeforeNextAction => {
                agent.update_sars(&state, action, reward, &next_state, rng)?;
                agent.get_action(&next_state, rng)?
            }
            UpdateTiming::AfterNextAction => {
                let next_action = agent.get_action(&next_state, rng)?;
                agent.update_sarsa(&state, action, reward, &next_state, next_action, rng)?;
                next_action
            }
        };

        state = next_state;
        action = next_action;
    }

    trace!(agent = agent.name(), steps, result, "episode finished");
    Ok(result)
}

/// Reset `agent` and run `num_episodes` episodes, returning one return per episode
pub fn run_agent_environment<A, E>(
    agent: &mut A,
    env: &mut E,
    num_episodes: usize,
    gamma: f64,
    rng: &RandomSource,
) -> Result<Vec<f64>>
where
    A: Agent + ?Sized,
    E: Environment + ?Sized,
{
    agent.reset(rng);

    let mut returns = Vec::with_capacity(num_episodes);
    for _ in 0..num_episodes {
        returns.push(run_episode(agent, env, gamma, rng)?);
    }

    debug!(agent = agent.name(), num_episodes, "trial finished");
    Ok(returns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, RLError, State};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Hook {
        GetAction,
        Sars,
        Sarsa,
        Last,
    }

    /// Walks states 0, 1, 2, ... and ends after `length` transitions
    struct Corridor {
        length: usize,
        num_states: usize,
        t: usize,
        reward: f64,
    }

    impl Corridor {
        fn new(length: usize, reward: f64) -> Self {
            Self {
                length,
                num_states: length + 1,
                t: 0,
                reward,
            }
        }
    }

    impl Environment for Corridor {
        fn max_episodes(&self) -> usize {
            10
        }

        fn state_dim(&self) -> usize {
            self.num_states
        }

        fn num_actions(&self) -> usize {
            2
        }

        fn gamma(&self) -> f64 {
            0.9
        }

        fn transition(&mut self, _action: Action, _rng: &RandomSource) -> Result<f64> {
            self.t += 1;
            Ok(self.reward)
        }

        fn state(&self) -> Result<State> {
            if self.in_terminal_absorbing_state() {
                return Err(RLError::TerminalState);
            }
            State::one_hot(self.t, self.num_states)
        }

        fn in_terminal_absorbing_state(&self) -> bool {
            self.t >= self.length
        }

        fn new_episode(&mut self, _rng: &RandomSource) {
            self.t = 0;
        }
    }

    struct Recorder {
        timing: UpdateTiming,
        log: Vec<Hook>,
        resets: usize,
        episodes: usize,
    }

    impl Recorder {
        fn new(timing: UpdateTiming) -> Self {
            Self {
                timing,
                log: Vec::new(),
                resets: 0,
                episodes: 0,
            }
        }
    }

    impl Agent for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn update_timing(&self) -> UpdateTiming {
            self.timing
        }

        fn get_action(&mut self, _state: &State, _rng: &RandomSource) -> Result<Action> {
            self.log.push(Hook::GetAction);
            Ok(0)
        }

        fn new_episode(&mut self) {
            self.episodes += 1;
        }

        fn reset(&mut self, _rng: &RandomSource) {
            self.resets += 1;
        }

        fn update_sars(
            &mut self,
            _state: &State,
            _action: Action,
            _reward: f64,
            _next_state: &State,
            _rng: &RandomSource,
        ) -> Result<()> {
            self.log.push(Hook::Sars);
            Ok(())
        }

        fn update_sarsa(
            &mut self,
            _state: &State,
            _action: Action,
            _reward: f64,
            _next_state: &State,
            _next_action: Action,
            _rng: &RandomSource,
        ) -> Result<()> {
            self.log.push(Hook::Sarsa);
            Ok(())
        }

        fn last_update(
            &mut self,
            _state: &State,
            _action: Action,
            _reward: f64,
            _rng: &RandomSource,
        ) -> Result<()> {
            self.log.push(Hook::Last);
            Ok(())
        }
    }

    /// Only implements the terminal hook, like a SARSA-timed agent would not implement SARS
    struct LastOnly;

    impl Agent for LastOnly {
        fn name(&self) -> &'static str {
            "last-only"
        }

        fn update_timing(&self) -> UpdateTiming {
            UpdateTiming::BeforeNextAction
        }

        fn get_action(&mut self, _state: &State, _rng: &RandomSource) -> Result<Action> {
            Ok(1)
        }

        fn reset(&mut self, _rng: &RandomSource) {}

        fn last_update(
            &mut self,
            _state: &State,
            _action: Action,
            _reward: f64,
            _rng: &RandomSource,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sars_ordering() {
        let rng = RandomSource::new(0);
        let mut agent = Recorder::new(UpdateTiming::BeforeNextAction);
        let mut env = Corridor::new(3, 1.0);

        run_episode(&mut agent, &mut env, 0.9, &rng).unwrap();

        use Hook::*;
        assert_eq!(
            agent.log,
            vec![GetAction, Sars, GetAction, Sars, GetAction, Last]
        );
    }

    #[test]
    fn test_sarsa_ordering() {
        let rng = RandomSource::new(0);
        let mut agent = Recorder::new(UpdateTiming::AfterNextAction);
        let mut env = Corridor::new(3, 1.0);

        run_episode(&mut agent, &mut env, 0.9, &rng).unwrap();

        use Hook::*;
        assert_eq!(
            agent.log,
            vec![GetAction, GetAction, Sarsa, GetAction, Sarsa, Last]
        );
    }

    #[test]
    fn test_discounted_return() {
        let rng = RandomSource::new(0);
        let mut agent = Recorder::new(UpdateTiming::AfterNextAction);
        let mut env = Corridor::new(3, 2.0);

        let ret = run_episode(&mut agent, &mut env, 0.5, &rng).unwrap();
        assert_relative_eq!(ret, 2.0 + 1.0 + 0.5);
    }

    #[test]
    fn test_single_step_episode_only_calls_last_update() {
        let rng = RandomSource::new(0);
        let mut agent = Recorder::new(UpdateTiming::AfterNextAction);
        let mut env = Corridor::new(1, -1.0);

        let ret = run_episode(&mut agent, &mut env, 0.9, &rng).unwrap();
        assert_relative_eq!(ret, -1.0);
        assert_eq!(agent.log, vec![Hook::GetAction, Hook::Last]);
    }

    #[test]
    fn test_timing_mismatch_is_reported() {
        let rng = RandomSource::new(0);
        let mut env = Corridor::new(4, 0.0);

        let err = run_episode(&mut LastOnly, &mut env, 0.9, &rng).unwrap_err();
        assert!(matches!(
            err,
            RLError::UnsupportedUpdate {
                agent: "last-only",
                hook: "update_sars"
            }
        ));
    }

    #[test]
    fn test_terminal_state_request_fails() {
        let rng = RandomSource::new(0);
        let mut env = Corridor::new(1, 0.0);
        env.new_episode(&rng);
        env.transition(0, &rng).unwrap();

        assert!(env.in_terminal_absorbing_state());
        assert!(matches!(env.state(), Err(RLError::TerminalState)));
    }

    #[test]
    fn test_run_agent_environment_resets_once() {
        let rng = RandomSource::new(0);
        let mut agent = Recorder::new(UpdateTiming::AfterNextAction);
        let mut env = Corridor::new(2, 1.0);

        let returns = run_agent_environment(&mut agent, &mut env, 5, 1.0, &rng).unwrap();

        assert_eq!(returns, vec![2.0; 5]);
        assert_eq!(agent.resets, 1);
        assert_eq!(agent.episodes, 5);
    }

    proptest! {
        #[test]
        fn prop_one_learning_hook_per_transition(
            length in 1usize..40,
            episodes in 1usize..5,
            before in any::<bool>(),
        ) {
            let timing = if before {
                UpdateTiming::BeforeNextAction
            } else {
                UpdateTiming::AfterNextAction
            };
            let rng = RandomSource::new(1);
            let mut agent = Recorder::new(timing);
            let mut env = Corridor::new(length, 1.0);

            run_agent_environment(&mut agent, &mut env, episodes, 0.9, &rng).unwrap();

            let count = |h: Hook| agent.log.iter().filter(|&&x| x == h).count();
            let (sars, sarsa) = (count(Hook::Sars), count(Hook::Sarsa));

            prop_assert!(sars == 0 || sarsa == 0);
            prop_assert_eq!(sars + sarsa, episodes * (length - 1));
            prop_assert_eq!(count(Hook::Last), episodes);
            prop_assert_eq!(count(Hook::GetAction), episodes * length);
        }
    }
}
