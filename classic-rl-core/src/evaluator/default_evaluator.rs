//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    record::{Record, RecordValue},
    Env, Obs, Policy,
};
use anyhow::Result;

/// Runs a fixed number of episodes and reports the average return.
///
/// The record has `"eval_return"` and `"eval_length"` (averages over episodes) and
/// `"eval_returns"`, the return of each episode.
///
/// Episode `i` starts from [`Env::reset_with_index`] with `i`, so every evaluation
/// sees the same initial states.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E> + ?Sized,
    {
        let mut returns = Vec::with_capacity(self.n_episodes);
        let mut len_total = 0usize;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut r = 0f32;

            loop {
                self.env.observation_space().check_dim(prev_obs.as_slice())?;
                let act = policy.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act)?;
                r += step.reward;
                len_total += 1;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
            returns.push(r);
        }

        let n = self.n_episodes as f32;
        let r_total: f32 = returns.iter().sum();
        Ok(Record::from_slice(&[
            ("eval_return", RecordValue::Scalar(r_total / n)),
            ("eval_length", RecordValue::Scalar(len_total as f32 / n)),
            ("eval_returns", RecordValue::Array1(returns)),
        ]))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// The environment is built from `config` with `seed`.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            return Err(crate::error::RlError::invalid_config(
                "n_episodes",
                "must be positive",
            )
            .into());
        }
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }
}
