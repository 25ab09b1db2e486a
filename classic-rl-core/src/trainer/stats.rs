//! Per-episode statistics.
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct Row {
    episode: usize,
    episode_return: f32,
    episode_length: usize,
}

/// Returns and lengths of training episodes, in the order they were run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeStats {
    returns: Vec<f32>,
    lengths: Vec<usize>,
}

impl EpisodeStats {
    /// Constructs empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an episode.
    pub fn push(&mut self, episode_return: f32, episode_length: usize) {
        self.returns.push(episode_return);
        self.lengths.push(episode_length);
    }

    /// Cumulative rewards of the episodes.
    pub fn returns(&self) -> &[f32] {
        &self.returns
    }

    /// The number of steps of the episodes.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// The number of episodes.
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// Returns `true` if no episode has been recorded.
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Mean return of the last `n` episodes, or all episodes if fewer.
    ///
    /// Returns `None` if there is no episode or `n == 0`.
    pub fn mean_last(&self, n: usize) -> Option<f32> {
        if self.returns.is_empty() || n == 0 {
            return None;
        }
        let tail = &self.returns[self.returns.len().saturating_sub(n)..];
        Some(tail.iter().sum::<f32>() / tail.len() as f32)
    }

    /// Iterates over `(return, length)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f32, usize)> + '_ {
        self.returns.iter().copied().zip(self.lengths.iter().copied())
    }

    /// Writes the statistics as a CSV file with columns
    /// `episode`, `episode_return` and `episode_length`.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for (i, (episode_return, episode_length)) in self.iter().enumerate() {
            wtr.serialize(Row {
                episode: i + 1,
                episode_return,
                episode_length,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
