//! One-hot state representation

use serde::{Deserialize, Serialize};

use crate::{RLError, Result};

/// Encode `index` as a one-hot vector of length `capacity`
pub fn to_one_hot(index: usize, capacity: usize) -> Result<Vec<f64>> {
    if index >= capacity {
        return Err(RLError::IndexOutOfCapacity { index, capacity });
    }
    let mut v = vec![0.0; capacity];
    v[index] = 1.0;
    Ok(v)
}

/// Index of the first non-zero entry of a one-hot vector
pub fn from_one_hot(v: &[f64]) -> Result<usize> {
    v.iter().position(|&x| x != 0.0).ok_or(RLError::NotOneHot)
}

/// A discrete state encoded as a one-hot vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    data: Vec<f64>,
}

impl State {
    /// Build the state with `index` set among `capacity` states
    pub fn one_hot(index: usize, capacity: usize) -> Result<Self> {
        Ok(Self {
            data: to_one_hot(index, capacity)?,
        })
    }

    /// Wrap a raw vector. Decoding fails later if it has no non-zero entry.
    #[must_use]
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Decode to the integer state index
    pub fn index(&self) -> Result<usize> {
        from_one_hot(&self.data)
    }

    /// Length of the state vector
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    /// Raw vector view
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
