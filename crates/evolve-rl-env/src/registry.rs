//! Environment registry for creating environments by name

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use evolve_rl_core::{Environment, RLError, Result};

use crate::gridworld::{Gridworld, GridworldConfig};

/// Builds an environment from optional JSON parameters (`Value::Null` for defaults)
pub type EnvConstructor = Box<dyn Fn(&Value) -> Result<Box<dyn Environment>> + Send + Sync>;

lazy_static::lazy_static! {
    static ref REGISTRY: Arc<RwLock<EnvRegistry>> = Arc::new(RwLock::new(EnvRegistry::new()));
}

/// Name to constructor map
pub struct EnvRegistry {
    envs: HashMap<String, EnvConstructor>,
}

impl EnvRegistry {
    /// Create a registry holding the built-in environments
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("gridworld", |params| {
            let config: GridworldConfig = if params.is_null() {
                GridworldConfig::default()
            } else {
                serde_json::from_value(params.clone())?
            };
            Ok(Box::new(Gridworld::new(config)?))
        });
        registry
    }

    /// Create a registry with nothing registered
    #[must_use]
    pub fn empty() -> Self {
        Self {
            envs: HashMap::new(),
        }
    }

    /// Register an environment, replacing any previous one with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&Value) -> Result<Box<dyn Environment>> + Send + Sync + 'static,
    {
        self.envs.insert(name.into(), Box::new(constructor));
    }

    /// Create an environment by name with default parameters
    pub fn make(&self, name: &str) -> Result<Box<dyn Environment>> {
        self.make_with(name, &Value::Null)
    }

    /// Create an environment by name with JSON parameters
    pub fn make_with(&self, name: &str, params: &Value) -> Result<Box<dyn Environment>> {
        self.envs
            .get(name)
            .ok_or_else(|| RLError::Environment(format!("Unknown environment: {name}")))
            .and_then(|constructor| constructor(params))
    }

    /// Whether `name` is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.envs.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.envs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register an environment globally
pub fn register_env<F>(name: impl Into<String>, constructor: F)
where
    F: Fn(&Value) -> Result<Box<dyn Environment>> + Send + Sync + 'static,
{
    REGISTRY.write().register(name, constructor);
}

/// Create an environment by name from the global registry
pub fn make_env(name: &str, params: &Value) -> Result<Box<dyn Environment>> {
    REGISTRY.read().make_with(name, params)
}

/// List all globally registered environments
#[must_use]
pub fn list_envs() -> Vec<String> {
    REGISTRY.read().list()
}
