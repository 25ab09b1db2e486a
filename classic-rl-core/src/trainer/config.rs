//! Configuration of [`Trainer`](super::Trainer).
use crate::{error::RlError, util};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`Trainer`](super::Trainer).
///
/// All intervals are counted in episodes.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub max_episodes: usize,

    /// Episodes longer than this are truncated by the trainer.
    /// `None` leaves truncation to the environment.
    pub max_steps_per_episode: Option<usize>,

    /// Interval of evaluation.
    pub eval_interval: usize,

    /// Interval of flushing records.
    pub flush_record_interval: usize,

    /// Interval of saving model parameters.
    pub save_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_episodes: 0,
            max_steps_per_episode: None,
            eval_interval: usize::MAX,
            flush_record_interval: usize::MAX,
            save_interval: usize::MAX,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn max_episodes(mut self, v: usize) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the maximum length of an episode.
    pub fn max_steps_per_episode(mut self, v: usize) -> Self {
        self.max_steps_per_episode = Some(v);
        self
    }

    /// Sets the interval of evaluation in episodes.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of flushing records in episodes.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Sets the interval of saving in episodes.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the directory the trained model being saved.
    pub fn model_dir<T: Into<String>>(mut self, model_dir: T) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), RlError> {
        for (name, v) in [
            ("eval_interval", self.eval_interval),
            ("flush_record_interval", self.flush_record_interval),
            ("save_interval", self.save_interval),
        ] {
            if v == 0 {
                return Err(RlError::invalid_config(name, "must be positive"));
            }
        }
        if self.max_steps_per_episode == Some(0) {
            return Err(RlError::invalid_config(
                "max_steps_per_episode",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        util::load_yaml(path)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        util::save_yaml(self, path)
    }
}
