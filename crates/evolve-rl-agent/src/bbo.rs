//! Tabular black-box optimization (episodic hill climbing)
//!
//! The agent keeps two policy tables. `new_theta` is the candidate that
//! selects actions while a batch of `N` episodes is collected. When the batch
//! completes, its mean discounted return is compared against the best
//! estimate so far; a strictly better candidate replaces `cur_theta`. The next
//! candidate is always drawn fresh around `cur_theta` with a uniform offset
//! per entry, so rejected candidates never accumulate drift.

use serde::{Deserialize, Serialize};
use tracing::debug;

use evolve_rl_core::{Action, Agent, RLError, RandomSource, Result, State, UpdateTiming};

use crate::policy::PolicyTable;
use crate::tracker::EpisodeTracker;

/// BBO configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BboConfig {
    /// Episodes evaluated per candidate policy
    pub batch_episodes: usize,
    /// Initial logit for every state-action pair
    pub initial_value: f64,
    /// Offsets are drawn from `[-perturbation_width, perturbation_width)`
    pub perturbation_width: f64,
    /// Trailing share of episodes that run the best policy unperturbed
    pub exploit_fraction: f64,
    /// Episodes per trial, needed for the exploitation phase
    pub max_episodes: Option<usize>,
}

impl Default for BboConfig {
    fn default() -> Self {
        Self {
            batch_episodes: 5,
            initial_value: 10.0,
            perturbation_width: 2.0,
            exploit_fraction: 0.0,
            max_episodes: None,
        }
    }
}

impl BboConfig {
    /// Check the configuration values
    pub fn validate(&self) -> Result<()> {
        if self.batch_episodes == 0 {
            return Err(RLError::Config("batch_episodes must be at least 1".into()));
        }
        if self.perturbation_width.is_nan() || self.perturbation_width < 0.0 {
            return Err(RLError::Config(format!(
                "perturbation_width must be non-negative, got {}",
                self.perturbation_width
            )));
        }
        if !(0.0..=1.0).contains(&self.exploit_fraction) {
            return Err(RLError::Config(format!(
                "exploit_fraction must lie in [0, 1], got {}",
                self.exploit_fraction
            )));
        }
        Ok(())
    }

    /// Completed episodes after which candidates stop being perturbed
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn exploit_after(&self) -> Option<usize> {
        if self.exploit_fraction <= 0.0 {
            return None;
        }
        self.max_episodes
            .map(|max| ((1.0 - self.exploit_fraction) * max as f64).ceil() as usize)
    }
}

/// Outcome of one candidate evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOutcome {
    /// Mean discounted return of the candidate
    pub estimate: f64,
    /// Whether the candidate replaced the best policy
    pub accepted: bool,
}

/// Episodic hill-climbing agent over softmax policy tables
#[derive(Debug, Clone)]
pub struct TabularBbo {
    config: BboConfig,
    gamma: f64,
    /// Best policy found so far
    cur_theta: PolicyTable,
    /// Estimate of how good `cur_theta` is
    cur_j_hat: f64,
    /// Candidate currently being evaluated
    new_theta: PolicyTable,
    last_outcome: Option<BatchOutcome>,
    tracker: EpisodeTracker,
    /// Episodes completed since the last reset
    episodes_seen: usize,
}

impl TabularBbo {
    /// Create a new BBO agent
    pub fn new(config: BboConfig, num_states: usize, num_actions: usize, gamma: f64) -> Result<Self> {
        config.validate()?;
        let tracker = EpisodeTracker::new(config.batch_episodes)?;
        let cur_theta = PolicyTable::new(num_states, num_actions, config.initial_value);
        let new_theta = cur_theta.clone();

        Ok(Self {
            config,
            gamma,
            cur_theta,
            cur_j_hat: f64::NEG_INFINITY,
            new_theta,
            last_outcome: None,
            tracker,
            episodes_seen: 0,
        })
    }

    /// Estimated return of the best policy.
    ///
    /// Starts at `-inf`, so the first evaluated batch is always accepted
    /// whatever its estimate.
    #[must_use]
    pub fn best_estimate(&self) -> f64 {
        self.cur_j_hat
    }

    /// Outcome of the most recent batch
    #[must_use]
    pub fn last_outcome(&self) -> Option<BatchOutcome> {
        self.last_outcome
    }

    /// Estimate of the most recently evaluated candidate
    #[must_use]
    pub fn last_batch_estimate(&self) -> Option<f64> {
        self.last_outcome.map(|o| o.estimate)
    }

    /// Best policy found so far
    #[must_use]
    pub fn current_policy(&self) -> &PolicyTable {
        &self.cur_theta
    }

    /// Candidate policy that is selecting actions
    #[must_use]
    pub fn candidate_policy(&self) -> &PolicyTable {
        &self.new_theta
    }

    /// Episodes completed since the last reset
    #[must_use]
    pub fn episodes_seen(&self) -> usize {
        self.episodes_seen
    }

    /// Discount used to score candidates
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    fn exploiting(&self) -> bool {
        self.config
            .exploit_after()
            .is_some_and(|after| self.episodes_seen >= after)
    }

    /// Mean discounted return over the buffered batch
    fn batch_estimate(&self) -> f64 {
        let episodes = self.tracker.episodes();
        let total: f64 = episodes.iter().map(|e| e.discounted_return(self.gamma)).sum();
        #[allow(clippy::cast_precision_loss)]
        let n = episodes.len() as f64;
        total / n
    }

    fn episodic_update(&mut self, rng: &RandomSource) -> BatchOutcome {
        let estimate = self.batch_estimate();
        let accepted = estimate > self.cur_j_hat;

        if accepted {
            std::mem::swap(&mut self.cur_theta, &mut self.new_theta);
            self.cur_j_hat = estimate;
            metrics::increment_counter!("evolve_rl_bbo_accepted_total");
            metrics::gauge!("evolve_rl_bbo_best_estimate", estimate);
        } else {
            metrics::increment_counter!("evolve_rl_bbo_rejected_total");
        }

        self.new_theta.assign(&self.cur_theta);
        if !self.exploiting() {
            self.new_theta.perturb(self.config.perturbation_width, rng);
        }

        self.tracker.wipe();

        debug!(
            estimate,
            accepted,
            best = self.cur_j_hat,
            episodes = self.episodes_seen,
            "bbo batch evaluated"
        );

        BatchOutcome { estimate, accepted }
    }
}

impl Agent for TabularBbo {
    fn name(&self) -> &'static str {
        "bbo"
    }

    fn update_timing(&self) -> UpdateTiming {
        UpdateTiming::AfterNextAction
    }

    fn is_episodic(&self) -> bool {
        true
    }

    fn get_action(&mut self, state: &State, rng: &RandomSource) -> Result<Action> {
        self.new_theta.sample_action(state, 1.0, rng)
    }

    fn reset(&mut self, _rng: &RandomSource) {
        self.cur_theta.fill(self.config.initial_value);
        self.new_theta.fill(self.config.initial_value);
        self.cur_j_hat = f64::NEG_INFINITY;
        self.last_outcome = None;
        self.episodes_seen = 0;
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
        rng: &RandomSource,
    ) -> Result<()> {
        let ready = self.tracker.last_update(state, action, reward)?;
        self.episodes_seen += 1;
        if ready {
            self.last_outcome = Some(self.episodic_update(rng));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const STATES: usize = 4;
    const ACTIONS: usize = 3;

    fn state(i: usize) -> State {
        State::one_hot(i, STATES).unwrap()
    }

    fn agent(batch_episodes: usize) -> TabularBbo {
        let config = BboConfig {
            batch_episodes,
            ..BboConfig::default()
        };
        TabularBbo::new(config, STATES, ACTIONS, 0.9).unwrap()
    }

    /// Feed one episode of `rewards` through the SARSA-timed hooks
    fn episode(agent: &mut TabularBbo, rewards: &[f64], rng: &RandomSource) {
        let (last, body) = rewards.split_last().unwrap();
        for (t, &r) in body.iter().enumerate() {
            agent
                .update_sarsa(&state(t % STATES), 0, r, &state((t + 1) % STATES), 0, rng)
                .unwrap();
        }
        agent.last_update(&state(body.len() % STATES), 1, *last, rng).unwrap();
    }

    #[test]
    fn test_timing() {
        let bbo = agent(1);
        assert!(!bbo.update_before_next_action());
        assert!(bbo.is_episodic());
    }

    #[test]
    fn test_sars_hook_unsupported() {
        let rng = RandomSource::new(0);
        let mut bbo = agent(1);
        assert!(matches!(
            bbo.update_sars(&state(0), 0, 0.0, &state(1), &rng),
            Err(RLError::UnsupportedUpdate { agent: "bbo", .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = BboConfig {
            batch_episodes: 0,
            ..BboConfig::default()
        };
        assert!(TabularBbo::new(config, 2, 2, 0.9).is_err());

        let config = BboConfig {
            exploit_fraction: 1.5,
            ..BboConfig::default()
        };
        assert!(TabularBbo::new(config, 2, 2, 0.9).is_err());
    }

    #[test]
    fn test_batch_estimate_uses_own_gamma() {
        let rng = RandomSource::new(1);
        let mut bbo = agent(2);

        episode(&mut bbo, &[0.0, 10.0], &rng);
        assert!(bbo.last_outcome().is_none());
        episode(&mut bbo, &[2.0], &rng);

        let outcome = bbo.last_outcome().unwrap();
        assert_relative_eq!(outcome.estimate, (0.9 * 10.0 + 2.0) / 2.0);
        assert!(outcome.accepted);
        assert_relative_eq!(bbo.best_estimate(), 5.5);
    }

    #[test]
    fn test_first_batch_always_accepted() {
        let rng = RandomSource::new(5);
        let mut bbo = agent(2);
        assert_eq!(bbo.best_estimate(), f64::NEG_INFINITY);

        episode(&mut bbo, &[-50.0], &rng);
        episode(&mut bbo, &[-50.0], &rng);

        let outcome = bbo.last_outcome().unwrap();
        assert!(outcome.accepted);
        assert_relative_eq!(bbo.best_estimate(), -50.0);
    }

    #[test]
    fn test_ties_do_not_replace() {
        let rng = RandomSource::new(2);
        let mut bbo = agent(1);

        episode(&mut bbo, &[1.0], &rng);
        let best = bbo.current_policy().clone();

        episode(&mut bbo, &[1.0], &rng);
        assert!(!bbo.last_outcome().unwrap().accepted);
        assert_eq!(bbo.current_policy(), &best);
    }

    #[test]
    fn test_candidate_restarts_from_best() {
        let rng = RandomSource::new(3);
        let mut bbo = agent(1);

        episode(&mut bbo, &[5.0], &rng);
        for _ in 0..20 {
            episode(&mut bbo, &[-1.0], &rng);
            let cur = bbo.current_policy().as_array();
            let new = bbo.candidate_policy().as_array();
            for (c, n) in cur.iter().zip(new.iter()) {
                assert!((n - c).abs() <= 2.0);
            }
        }
        assert_relative_eq!(bbo.best_estimate(), 5.0);
    }

    #[test]
    fn test_accepted_candidate_becomes_best() {
        let rng = RandomSource::new(4);
        let mut bbo = agent(1);

        episode(&mut bbo, &[0.0], &rng);
        let candidate = bbo.candidate_policy().clone();
        episode(&mut bbo, &[3.0], &rng);

        assert!(bbo.last_outcome().unwrap().accepted);
        assert_eq!(bbo.current_policy(), &candidate);
    }

    #[test]
    fn test_exploitation_phase_stops_perturbing() {
        let rng = RandomSource::new(5);
        let config = BboConfig {
            batch_episodes: 1,
            exploit_fraction: 0.5,
            max_episodes: Some(4),
            ..BboConfig::default()
        };
        let mut bbo = TabularBbo::new(config, STATES, ACTIONS, 0.9).unwrap();

        episode(&mut bbo, &[1.0], &rng);
        assert_ne!(bbo.candidate_policy(), bbo.current_policy());

        episode(&mut bbo, &[0.0], &rng);
        assert_eq!(bbo.episodes_seen(), 2);
        assert_eq!(bbo.candidate_policy(), bbo.current_policy());
    }

    #[test]
    fn test_reset_restores_blank_slate() {
        let rng = RandomSource::new(6);
        let mut bbo = agent(1);
        episode(&mut bbo, &[7.0], &rng);
        bbo.update_sarsa(&state(0), 0, 1.0, &state(1), 0, &rng).unwrap();

        bbo.reset(&rng);

        assert_eq!(bbo.best_estimate(), f64::NEG_INFINITY);
        assert_eq!(bbo.episodes_seen(), 0);
        assert!(bbo.last_outcome().is_none());
        assert!(bbo.current_policy().as_array().iter().all(|&x| x == 10.0));
        assert!(bbo.candidate_policy().as_array().iter().all(|&x| x == 10.0));
    }

    #[test]
    fn test_zero_actions_is_an_error() {
        let rng = RandomSource::new(7);
        let mut bbo = TabularBbo::new(BboConfig::default(), STATES, 0, 0.9).unwrap();
        assert!(matches!(
            bbo.get_action(&state(0), &rng),
            Err(RLError::NoActions)
        ));
    }

    proptest! {
        #[test]
        fn prop_best_estimate_non_decreasing(
            seed in any::<u64>(),
            batch in 1usize..4,
            episodes in proptest::collection::vec(
                proptest::collection::vec(-100.0f64..100.0, 1..6),
                1..30,
            ),
        ) {
            let rng = RandomSource::new(seed);
            let mut bbo = agent(batch);
            let mut previous = bbo.best_estimate();

            for rewards in &episodes {
                episode(&mut bbo, rewards, &rng);
                let best = bbo.best_estimate();
                prop_assert!(best >= previous);
                if let Some(outcome) = bbo.last_outcome() {
                    prop_assert!(best >= outcome.estimate);
                }
                previous = best;
            }
        }
    }
}
