//! Writing run summaries to disk

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::TrialConfig;
use crate::stats::ReturnSummary;

/// Destination for a finished run's summary
#[async_trait]
pub trait SummarySink: Send {
    /// Persist the summary
    async fn write(&mut self, summary: &ReturnSummary) -> Result<()>;
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Write `summary` to every sink.
///
/// A failing sink does not stop the others; the first failure is returned
/// once all sinks have been tried.
pub async fn publish(summary: &ReturnSummary, sinks: &mut [Box<dyn SummarySink>]) -> Result<()> {
    let mut first_error = None;
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.write(summary).await {
            warn!(error = %e, "failed to write summary");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// `<stem>_out.csv` with a `mean,stderr` header and one row per episode
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Sink writing to `<stem>_out.csv`
    pub fn new(stem: impl AsRef<Path>) -> Self {
        let mut path = stem.as_ref().as_os_str().to_owned();
        path.push("_out.csv");
        Self { path: path.into() }
    }

    /// Target file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(summary: &ReturnSummary) -> String {
        let rows: String = summary
            .iter()
            .map(|(mean, stderr)| format!("{mean},{stderr}\n"))
            .collect();
        format!("mean,stderr\n{rows}")
    }
}

#[async_trait]
impl SummarySink for CsvSink {
    async fn write(&mut self, summary: &ReturnSummary) -> Result<()> {
        ensure_parent(&self.path).await?;
        fs::write(&self.path, Self::render(summary))
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!(path = %self.path.display(), episodes = summary.len(), "wrote csv summary");
        Ok(())
    }
}

/// Full JSON report of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport<'a> {
    /// Unique id for this run
    pub run_id: Uuid,
    /// When the report was written
    pub completed_at: DateTime<Utc>,
    /// Configuration the run used
    pub config: &'a TrialConfig,
    /// Per-episode results
    pub summary: &'a ReturnSummary,
}

/// Pretty JSON report with run id, completion time, config and summary
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
    config: TrialConfig,
    run_id: Uuid,
}

impl JsonSink {
    /// Sink writing to `path` and recording `config`
    pub fn new(path: impl Into<PathBuf>, config: TrialConfig) -> Self {
        Self {
            path: path.into(),
            config,
            run_id: Uuid::new_v4(),
        }
    }

    /// Id recorded in the report
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Target file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SummarySink for JsonSink {
    async fn write(&mut self, summary: &ReturnSummary) -> Result<()> {
        let report = RunReport {
            run_id: self.run_id,
            completed_at: Utc::now(),
            config: &self.config,
            summary,
        };
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;

        ensure_parent(&self.path).await?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        info!(path = %self.path.display(), run_id = %self.run_id, "wrote json report");
        Ok(())
    }
}
