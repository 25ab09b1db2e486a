//! Configuration of [`SimpleReplayBuffer`](super::SimpleReplayBuffer).
use crate::{error::RlError, util};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`SimpleReplayBuffer`](super::SimpleReplayBuffer).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SimpleReplayBufferConfig {
    pub(super) capacity: usize,
    pub(super) seed: u64,
}

impl Default for SimpleReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 42,
        }
    }
}

impl SimpleReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Returns the capacity.
    pub fn get_capacity(&self) -> usize {
        self.capacity
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), RlError> {
        if self.capacity == 0 {
            return Err(RlError::invalid_config("capacity", "must be positive"));
        }
        Ok(())
    }

    /// Loads [`SimpleReplayBufferConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        util::load_yaml(path)
    }

    /// Saves [`SimpleReplayBufferConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        util::save_yaml(self, path)
    }
}
