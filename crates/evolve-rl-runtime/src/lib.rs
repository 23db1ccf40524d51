//! Trial orchestration for evolve-rl
//!
//! Runs many independent agent/environment trials, concurrently on the tokio
//! blocking pool or sequentially, aggregates the per-episode returns into
//! means with standard errors and writes the result to CSV or JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod output;
pub mod stats;
pub mod trial;

pub use config::{SeedStrategy, TrialConfig};
pub use output::{publish, CsvSink, JsonSink, RunReport, SummarySink};
pub use stats::{ReturnSummary, ReturnsMatrix};
pub use trial::TrialRunner;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CsvSink, JsonSink, ReturnSummary, ReturnsMatrix, SeedStrategy, SummarySink, TrialConfig,
        TrialRunner,
    };
    pub use evolve_rl_agent::prelude::*;
}
