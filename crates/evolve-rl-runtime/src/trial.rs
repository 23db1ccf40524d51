//! Independent trials of one agent on one environment

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use evolve_rl_agent::AgentConfig;
use evolve_rl_core::{run_agent_environment, Environment, RLError, RandomSource};
use evolve_rl_env::{make_env, EnvRegistry};

use crate::config::{SeedStrategy, TrialConfig};
use crate::stats::ReturnsMatrix;

/// Tolerance when comparing a configured discount with the environment's
const GAMMA_TOLERANCE: f64 = 1e-12;

/// Resolved, environment-checked description of a single trial
struct TrialPlan {
    environment: String,
    environment_params: Value,
    agent: AgentConfig,
    episodes: usize,
    gamma: f64,
    registry: Option<Arc<EnvRegistry>>,
}

impl TrialPlan {
    fn make_env(&self) -> Result<Box<dyn Environment>> {
        let env = match &self.registry {
            Some(registry) => registry.make_with(&self.environment, &self.environment_params),
            None => make_env(&self.environment, &self.environment_params),
        };
        env.with_context(|| format!("Failed to create environment {}", self.environment))
    }

    fn run_trial(&self, trial: usize, rng: &RandomSource) -> Result<Vec<f64>> {
        debug!(trial, agent = self.agent.name(), "starting trial");

        let mut env = self.make_env()?;
        let mut agent = self
            .agent
            .build(env.state_dim(), env.num_actions(), env.gamma(), self.episodes)
            .with_context(|| format!("Failed to build {} agent", self.agent.name()))?;

        let returns = run_agent_environment(&mut agent, &mut env, self.episodes, self.gamma, rng)
            .with_context(|| format!("Trial {trial} failed"))?;

        debug!(
            trial,
            final_return = returns.last().copied().unwrap_or_default(),
            "finished trial"
        );
        Ok(returns)
    }
}

/// Runs `trials` independent agent/environment pairs and collects their returns
pub struct TrialRunner {
    config: TrialConfig,
    rng: RandomSource,
    registry: Option<Arc<EnvRegistry>>,
}

impl TrialRunner {
    /// Create a runner drawing shared randomness from `rng`
    #[must_use]
    pub fn new(config: TrialConfig, rng: RandomSource) -> Self {
        Self {
            config,
            rng,
            registry: None,
        }
    }

    /// Create a runner whose shared source is seeded from the config
    #[must_use]
    pub fn from_config(config: TrialConfig) -> Self {
        let rng = RandomSource::new(config.seed);
        Self::new(config, rng)
    }

    /// Build environments from `registry` instead of the global one
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<EnvRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    /// Random source for trial `trial`
    fn trial_rng(&self, trial: usize) -> RandomSource {
        match self.config.seed_strategy {
            SeedStrategy::Shared => self.rng.clone(),
            SeedStrategy::PerTrial => RandomSource::new(self.config.seed.wrapping_add(trial as u64)),
        }
    }

    /// Probe the environment once and fix episode count and discount
    fn plan(&self) -> Result<TrialPlan> {
        self.config.validate()?;

        let mut plan = TrialPlan {
            environment: self.config.environment.clone(),
            environment_params: self.config.environment_params.clone(),
            agent: self.config.agent.clone(),
            episodes: 0,
            gamma: 0.0,
            registry: self.registry.clone(),
        };
        let probe = plan.make_env()?;

        let gamma = probe.gamma();
        if let Some(expected) = self.config.gamma {
            if (expected - gamma).abs() > GAMMA_TOLERANCE {
                return Err(RLError::Config(format!(
                    "configured gamma {expected} does not match {} gamma {gamma}",
                    self.config.environment
                ))
                .into());
            }
        }

        plan.gamma = gamma;
        plan.episodes = self.config.max_episodes.unwrap_or_else(|| probe.max_episodes());
        Ok(plan)
    }

    fn log_progress(&self, finished: usize) {
        let interval = self.config.log_interval;
        if interval > 0 && finished % interval == 0 {
            info!(finished, total = self.config.trials, "trials completed");
        }
    }

    /// Run every trial concurrently on the blocking pool.
    ///
    /// Returns as soon as any trial fails. Trials that have not started are
    /// cancelled; ones already running finish in the background and their
    /// results are discarded.
    pub async fn run(&self) -> Result<ReturnsMatrix> {
        let plan = Arc::new(self.plan()?);
        let trials = self.config.trials;
        info!(
            trials,
            episodes = plan.episodes,
            agent = plan.agent.name(),
            environment = %plan.environment,
            "starting concurrent trials"
        );

        let mut tasks = JoinSet::new();
        for trial in 0..trials {
            let plan = Arc::clone(&plan);
            let rng = self.trial_rng(trial);
            tasks.spawn_blocking(move || (trial, plan.run_trial(trial, &rng)));
        }

        let mut returns = ReturnsMatrix::zeros(trials, plan.episodes);
        let mut finished = 0;
        while let Some(joined) = tasks.join_next().await {
            let (trial, result) = joined.context("Trial task panicked")?;
            match result {
                Ok(row) => returns.set_row(trial, &row)?,
                Err(e) => {
                    warn!(trial, error = %e, "aborting run");
                    tasks.abort_all();
                    return Err(e);
                }
            }
            finished += 1;
            self.log_progress(finished);
        }

        info!(trials, "all trials finished");
        Ok(returns)
    }

    /// Run every trial one after another on the calling thread
    pub fn run_sequential(&self) -> Result<ReturnsMatrix> {
        let plan = self.plan()?;
        let trials = self.config.trials;
        info!(
            trials,
            episodes = plan.episodes,
            agent = plan.agent.name(),
            environment = %plan.environment,
            "starting sequential trials"
        );

        let mut returns = ReturnsMatrix::zeros(trials, plan.episodes);
        for trial in 0..trials {
            let row = plan.run_trial(trial, &self.trial_rng(trial))?;
            returns.set_row(trial, &row)?;
            self.log_progress(trial + 1);
        }
        Ok(returns)
    }
}
