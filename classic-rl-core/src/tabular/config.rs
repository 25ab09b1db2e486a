//! Configuration of tabular agents.
use crate::{error::RlError, explorer::EpsilonGreedy, util};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bounds used for discretization instead of those of the observation space.
///
/// Needed when the observation space is unbounded in some dimension, like the
/// velocities of CartPole.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DiscretizerBounds {
    /// Lower bounds.
    pub low: Vec<f32>,

    /// Upper bounds.
    pub high: Vec<f32>,
}

/// Configuration of [`Sarsa`](super::Sarsa) and [`QLearning`](super::QLearning).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct TabularConfig {
    /// The number of grid cells per observation dimension.
    pub n_cells: Vec<usize>,

    /// Discretization bounds. The bounds of the observation space are used if `None`.
    pub bounds: Option<DiscretizerBounds>,

    /// Step size of the update.
    pub alpha: f32,

    /// Discount factor.
    pub discount_factor: f32,

    /// Explorer used in training mode.
    pub explorer: EpsilonGreedy,

    /// Random seed.
    pub seed: u64,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            n_cells: vec![],
            bounds: None,
            alpha: 0.1,
            discount_factor: 0.99,
            explorer: EpsilonGreedy::constant(0.1),
            seed: 42,
        }
    }
}

impl TabularConfig {
    /// Sets the number of grid cells per observation dimension.
    pub fn n_cells(mut self, n_cells: Vec<usize>) -> Self {
        self.n_cells = n_cells;
        self
    }

    /// Sets discretization bounds.
    pub fn bounds(mut self, low: Vec<f32>, high: Vec<f32>) -> Self {
        self.bounds = Some(DiscretizerBounds { low, high });
        self
    }

    /// Sets the step size.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the hyperparameters.
    pub fn validate(&self) -> Result<(), RlError> {
        if self.n_cells.is_empty() {
            return Err(RlError::invalid_config("n_cells", "is empty"));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(RlError::invalid_config(
                "alpha",
                format!("{} is not in (0, 1]", self.alpha),
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(RlError::invalid_config(
                "discount_factor",
                format!("{} is not in [0, 1]", self.discount_factor),
            ));
        }
        self.explorer.validate()
    }

    /// Loads [`TabularConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        util::load_yaml(path)
    }

    /// Saves [`TabularConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        util::save_yaml(self, path)
    }
}
