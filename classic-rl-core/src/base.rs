//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod space;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::Policy;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
pub use space::{BoxSpace, DiscreteSpace};
use std::fmt::Debug;
pub use step::{Info, Step, Transition};

/// An observation of an environment.
///
/// Observations handled in this library are fixed-length vectors of `f32`.
pub trait Obs: Clone + Debug {
    /// Returns the elements of the observation.
    fn as_slice(&self) -> &[f32];

    /// Returns the dimension of the observation.
    fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/// An action of an environment.
///
/// Actions are indices into a finite action set.
pub trait Act: Clone + Debug {
    /// Constructs an action from its index.
    fn from_index(ix: usize) -> Self;

    /// Returns the index of the action.
    fn index(&self) -> usize;
}

/// A generic observation backed by `Vec<f32>`.
#[derive(Clone, Debug, PartialEq)]
pub struct VecObs(pub Vec<f32>);

impl Obs for VecObs {
    fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for VecObs {
    fn from(v: Vec<f32>) -> Self {
        Self(v)
    }
}

/// A generic discrete action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscreteAct(pub usize);

impl Act for DiscreteAct {
    fn from_index(ix: usize) -> Self {
        Self(ix)
    }

    fn index(&self) -> usize {
        self.0
    }
}
