//! Observation and action spaces.
use crate::error::RlError;
use serde::{Deserialize, Serialize};

/// A box in `R^n` given by element-wise bounds.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct BoxSpace {
    low: Vec<f32>,
    high: Vec<f32>,
}

impl BoxSpace {
    /// Constructs a box space.
    ///
    /// Bounds may be infinite, but `low[i] <= high[i]` must hold.
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self, RlError> {
        if low.len() != high.len() {
            return Err(RlError::invalid_config(
                "BoxSpace",
                format!("low has {} elements, high has {}", low.len(), high.len()),
            ));
        }
        if let Some(i) = (0..low.len()).find(|&i| !(low[i] <= high[i])) {
            return Err(RlError::invalid_config(
                "BoxSpace",
                format!("low[{}] = {} exceeds high[{}] = {}", i, low[i], i, high[i]),
            ));
        }
        Ok(Self { low, high })
    }

    /// Lower bounds.
    pub fn low(&self) -> &[f32] {
        &self.low
    }

    /// Upper bounds.
    pub fn high(&self) -> &[f32] {
        &self.high
    }

    /// Dimension of the space.
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Checks the dimension of an observation.
    pub fn check_dim(&self, obs: &[f32]) -> Result<(), RlError> {
        if obs.len() != self.dim() {
            return Err(RlError::ObsDimMismatch {
                expected: self.dim(),
                got: obs.len(),
            });
        }
        Ok(())
    }
}

/// A finite set of actions `{0, 1, ..., n - 1}`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct DiscreteSpace {
    n: usize,
}

impl DiscreteSpace {
    /// Constructs a discrete space with `n` actions.
    pub fn new(n: usize) -> Result<Self, RlError> {
        if n == 0 {
            return Err(RlError::invalid_config(
                "DiscreteSpace",
                "the number of actions must be positive",
            ));
        }
        Ok(Self { n })
    }

    /// The number of actions.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Fails if `act` is not in `[0, n)`.
    pub fn check(&self, act: usize) -> Result<(), RlError> {
        if act >= self.n {
            return Err(RlError::ActionOutOfRange { act, n: self.n });
        }
        Ok(())
    }
}
