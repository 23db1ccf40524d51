//! Error types for the RL core library

use thiserror::Error;

/// Core error type for RL operations
///
/// Every variant reflects a logic or configuration bug rather than a
/// transient condition. Callers propagate them and abort the run.
#[derive(Error, Debug)]
pub enum RLError {
    /// The interaction protocol was violated
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// State requested while the environment sits in its terminal absorbing state
    #[error("Protocol violation: state requested in the terminal absorbing state")]
    TerminalState,

    /// A state vector had no non-zero entry
    #[error("Protocol violation: state vector was all zeros")]
    NotOneHot,

    /// An update hook the agent does not implement for its declared timing
    #[error("{hook} is not supported by {agent}")]
    UnsupportedUpdate {
        /// Agent name
        agent: &'static str,
        /// Hook that was invoked
        hook: &'static str,
    },

    /// One-hot index past the declared capacity
    #[error("Cannot index past capacity: index {index}, capacity {capacity}")]
    IndexOutOfCapacity {
        /// Requested index
        index: usize,
        /// Declared capacity
        capacity: usize,
    },

    /// Action selection over an empty action set
    #[error("Cannot select an action: the action set is empty")]
    NoActions,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
