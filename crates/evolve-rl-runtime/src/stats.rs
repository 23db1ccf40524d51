//! Per-episode aggregation across trials

use anyhow::{ensure, Result};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Discounted returns, one row per trial and one column per episode
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnsMatrix {
    data: Array2<f64>,
}

impl ReturnsMatrix {
    /// Zero-filled matrix for `trials` rows of `episodes` returns
    #[must_use]
    pub fn zeros(trials: usize, episodes: usize) -> Self {
        Self {
            data: Array2::zeros((trials, episodes)),
        }
    }

    /// Build from complete rows, which must all share one length
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let episodes = rows.first().map_or(0, Vec::len);
        let mut matrix = Self::zeros(rows.len(), episodes);
        for (i, row) in rows.iter().enumerate() {
            matrix.set_row(i, row)?;
        }
        Ok(matrix)
    }

    /// Store the returns of trial `trial`
    pub fn set_row(&mut self, trial: usize, returns: &[f64]) -> Result<()> {
        ensure!(
            trial < self.trials(),
            "trial {trial} out of range for {} trials",
            self.trials()
        );
        ensure!(
            returns.len() == self.episodes(),
            "trial {trial} produced {} returns, expected {}",
            returns.len(),
            self.episodes()
        );
        self.data
            .row_mut(trial)
            .iter_mut()
            .zip(returns)
            .for_each(|(dst, &src)| *dst = src);
        Ok(())
    }

    /// Returns of one trial
    #[must_use]
    pub fn row(&self, trial: usize) -> ArrayView1<'_, f64> {
        self.data.row(trial)
    }

    /// Number of trials
    #[must_use]
    pub fn trials(&self) -> usize {
        self.data.nrows()
    }

    /// Number of episodes per trial
    #[must_use]
    pub fn episodes(&self) -> usize {
        self.data.ncols()
    }

    /// Underlying array
    #[must_use]
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Mean and standard error of the return at every episode.
    ///
    /// The standard error uses the sample deviation (one delta degree of
    /// freedom) and is zero when there are fewer than two trials.
    #[must_use]
    pub fn summarize(&self) -> ReturnSummary {
        let episodes = self.episodes();
        let mean = self
            .data
            .mean_axis(Axis(0))
            .map_or_else(|| vec![0.0; episodes], |m| m.to_vec());

        let n = self.trials();
        let stderr = if n < 2 {
            vec![0.0; episodes]
        } else {
            #[allow(clippy::cast_precision_loss)]
            let sqrt_n = (n as f64).sqrt();
            self.data
                .std_axis(Axis(0), 1.0)
                .iter()
                .map(|sd| sd / sqrt_n)
                .collect()
        };

        ReturnSummary { mean, stderr }
    }
}

/// Per-episode mean return and its standard error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSummary {
    /// Mean return across trials
    pub mean: Vec<f64>,
    /// Standard error of the mean
    pub stderr: Vec<f64>,
}

impl ReturnSummary {
    /// Number of episodes summarized
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether there are no episodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// `(mean, stderr)` pairs in episode order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mean.iter().copied().zip(self.stderr.iter().copied())
    }

    /// Average of the mean returns over an episode range
    #[must_use]
    pub fn window_mean(&self, range: std::ops::Range<usize>) -> Option<f64> {
        let window = self.mean.get(range)?;
        if window.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = window.len() as f64;
        Some(window.iter().sum::<f64>() / n)
    }
}
