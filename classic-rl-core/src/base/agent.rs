//! Agent.
use super::{Env, Policy, Transition};
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy on an environment.
///
/// Agents learn from the transitions handed to [`Agent::observe`], one per
/// environment step. When the update happens is up to the agent: tabular and
/// actor-critic agents update at every step, DQN updates from its replay buffer
/// and REINFORCE waits for the end of the episode.
pub trait Agent<E: Env>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Called at the start of every episode with the initial observation.
    #[allow(unused_variables)]
    fn reset(&mut self, init_obs: &E::Obs) {}

    /// Takes a transition and performs an optimization step if the agent is ready.
    ///
    /// Returns `None` if no optimization step was done.
    fn observe(&mut self, transition: Transition<E::Obs, E::Act>) -> Result<Option<Record>>;

    /// Save the parameters of the agent in the given directory.
    /// This method commonly creates a number of files consisting the agent
    /// in the directory. For example, the DQN agent saves two Q-networks
    /// corresponding to the online and target networks.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Load the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
