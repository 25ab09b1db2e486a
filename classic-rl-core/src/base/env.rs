//! Environment.
use super::{Act, BoxSpace, DiscreteSpace, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [self::Step] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    ///
    /// An action outside of [`Env::action_space`] is an error, it is never clamped.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a random seed,
    /// which is useful when evaluation of a trained agent. Actually, this method is called
    /// in [`DefaultEvaluator`] for evaluation.
    ///
    /// [`DefaultEvaluator`]: crate::DefaultEvaluator
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;

    /// Element-wise bounds of observations.
    fn observation_space(&self) -> &BoxSpace;

    /// The set of actions.
    fn action_space(&self) -> &DiscreteSpace;
}
