//! Action selection.
//!
//! [`EpsilonGreedy`] selects actions from a vector of action values, used by the
//! tabular agents and DQN. [`sample_categorical`] draws an action from the action
//! probabilities of a stochastic policy, used by REINFORCE and Actor-Critic.
use crate::error::RlError;
use itertools::Itertools;
use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use serde::{Deserialize, Serialize};

/// Largest deviation of the sum of probabilities from one accepted by [`sample_categorical`].
pub const PROB_TOLERANCE: f32 = 1e-3;

/// Returns the index of the largest value.
///
/// Ties are broken uniformly at random among all maximizing indices.
pub fn argmax_random_tie<R: Rng>(values: &[f32], rng: &mut R) -> Result<usize, RlError> {
    if values.is_empty() {
        return Err(RlError::invalid_config(
            "action values",
            "at least one action is required",
        ));
    }
    let best = values
        .iter()
        .enumerate()
        .max_set_by(|a, b| a.1.total_cmp(b.1));
    Ok(best[rng.gen_range(0..best.len())].0)
}

/// Samples an action index from a probability vector.
///
/// Small floating-point drift of the sum is tolerated (see [`PROB_TOLERANCE`]), but
/// negative or non-finite entries and distributions far from normalized are rejected.
pub fn sample_categorical<R: Rng>(probs: &[f32], rng: &mut R) -> Result<usize, RlError> {
    if probs.is_empty() {
        return Err(RlError::InvalidProbabilities("empty vector".to_string()));
    }
    if let Some(i) = probs.iter().position(|p| !p.is_finite() || *p < 0.0) {
        return Err(RlError::InvalidProbabilities(format!(
            "probs[{}] = {}",
            i, probs[i]
        )));
    }
    let sum: f32 = probs.iter().sum();
    if (sum - 1.0).abs() > PROB_TOLERANCE {
        return Err(RlError::InvalidProbabilities(format!(
            "probabilities sum to {}",
            sum
        )));
    }
    let dist =
        WeightedIndex::new(probs).map_err(|e| RlError::InvalidProbabilities(e.to_string()))?;
    Ok(dist.sample(rng))
}

/// Epsilon-greedy action selection.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over `final_step` selections.
/// Use [`EpsilonGreedy::constant`] for a fixed epsilon.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// The number of selections done so far.
    pub n_opts: usize,

    /// Epsilon at the first selection.
    pub eps_start: f64,

    /// Epsilon after `final_step` selections.
    pub eps_final: f64,

    /// The number of selections over which epsilon decays.
    pub final_step: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self::new()
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self {
            n_opts: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step: 100_000,
        }
    }

    /// Constructs epsilon-greedy explorer with a fixed epsilon.
    pub fn constant(eps: f64) -> Self {
        Self {
            n_opts: 0,
            eps_start: eps,
            eps_final: eps,
            final_step: 1,
        }
    }

    /// Constructs epsilon-greedy explorer decaying over `final_step` selections.
    pub fn with_final_step(final_step: usize) -> Self {
        Self {
            final_step,
            ..Self::new()
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), RlError> {
        for (name, eps) in [("eps_start", self.eps_start), ("eps_final", self.eps_final)] {
            if !(0.0..=1.0).contains(&eps) {
                return Err(RlError::invalid_config(
                    name,
                    format!("{} is not in [0, 1]", eps),
                ));
            }
        }
        if self.eps_final > self.eps_start {
            return Err(RlError::invalid_config(
                "eps_final",
                "must not exceed eps_start",
            ));
        }
        if self.final_step == 0 {
            return Err(RlError::invalid_config("final_step", "must be positive"));
        }
        Ok(())
    }

    /// Current epsilon.
    pub fn epsilon(&self) -> f64 {
        let d = (self.eps_start - self.eps_final) / (self.final_step as f64);
        (self.eps_start - d * self.n_opts as f64).max(self.eps_final)
    }

    /// Takes an action based on action values.
    ///
    /// With probability epsilon a uniformly random action is returned, otherwise
    /// the greedy action with random tie-breaking.
    pub fn action<R: Rng>(
        &mut self,
        values: &[f32],
        rng: &mut R,
    ) -> Result<usize, RlError> {
        let eps = self.epsilon();
        self.n_opts += 1;

        if rng.gen::<f64>() < eps {
            if values.is_empty() {
                return Err(RlError::invalid_config(
                    "action values",
                    "at least one action is required",
                ));
            }
            Ok(rng.gen_range(0..values.len()))
        } else {
            argmax_random_tie(values, rng)
        }
    }
}
