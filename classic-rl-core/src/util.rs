//! Utilities.
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Computes discounted returns `G_t = r_t + gamma * G_t+1` backward from the end
/// of an episode, with `G_T = r_T`.
pub fn discounted_returns(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0f32; rewards.len()];
    let mut g = 0f32;
    for (t, r) in rewards.iter().enumerate().rev() {
        g = r + gamma * g;
        returns[t] = g;
    }
    returns
}

/// Returns a one-hot vector of length `n` with `1` at `ix`.
pub fn one_hot(ix: usize, n: usize) -> Vec<f32> {
    let mut v = vec![0f32; n];
    v[ix] = 1.0;
    v
}

/// Loads a YAML file into a configuration object.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path)?;
    let rdr = BufReader::new(file);
    Ok(serde_yaml::from_reader(rdr)?)
}

/// Saves a configuration object as a YAML file.
pub fn save_yaml<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(serde_yaml::to_string(value)?.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discounted_returns() {
        assert_eq!(discounted_returns(&[1.0, 1.0, 1.0], 0.5), vec![1.75, 1.5, 1.0]);
        assert_eq!(discounted_returns(&[], 0.9), Vec::<f32>::new());
    }

    #[test]
    fn test_discounted_returns_recursion() {
        let (r, gamma) = ([0.5f32, -1.0, 2.0], 0.9f32);
        let g = discounted_returns(&r, gamma);
        assert_eq!(g[2], r[2]);
        assert!((g[1] - (r[1] + gamma * g[2])).abs() < 1e-6);
        assert!((g[0] - (r[0] + gamma * g[1])).abs() < 1e-6);
    }

    #[test]
    fn test_one_hot() {
        assert_eq!(one_hot(1, 3), vec![0.0, 1.0, 0.0]);
    }
}
