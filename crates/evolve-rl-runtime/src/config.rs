//! Trial run configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use evolve_rl_agent::AgentConfig;

/// How random sources are handed to trials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Every trial draws from one source seeded once
    #[default]
    Shared,
    /// Trial `i` draws from its own source seeded `seed + i`
    PerTrial,
}

/// Everything needed to reproduce a batch of trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    /// Registered environment name
    pub environment: String,
    /// Parameters passed to the environment constructor
    pub environment_params: Value,
    /// Agent algorithm and hyperparameters
    pub agent: AgentConfig,
    /// Number of independent trials
    pub trials: usize,
    /// Seed for the random source(s)
    pub seed: u64,
    /// Shared or per-trial random sources
    pub seed_strategy: SeedStrategy,
    /// Episodes per trial; the environment's own count when unset
    pub max_episodes: Option<usize>,
    /// Expected discount; must match the environment when set
    pub gamma: Option<f64>,
    /// Log progress every this many finished trials (0 disables)
    pub log_interval: usize,
    /// Output file stem, e.g. `results/bbo` for `results/bbo_out.csv`
    pub output_stem: String,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            environment: "gridworld".to_string(),
            environment_params: Value::Null,
            agent: AgentConfig::default(),
            trials: 100,
            seed: 0,
            seed_strategy: SeedStrategy::Shared,
            max_episodes: None,
            gamma: None,
            log_interval: 10,
            output_stem: "trials".to_string(),
        }
    }
}

impl TrialConfig {
    /// Parse a config from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse trial config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trial config {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Check the fields that do not depend on the environment
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            anyhow::bail!("trials must be at least 1");
        }
        if self.max_episodes == Some(0) {
            anyhow::bail!("max_episodes must be at least 1");
        }
        if let Some(gamma) = self.gamma {
            if !(0.0..=1.0).contains(&gamma) {
                anyhow::bail!("gamma must lie in [0, 1], got {gamma}");
            }
        }
        Ok(())
    }
}
