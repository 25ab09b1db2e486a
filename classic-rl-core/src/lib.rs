#![warn(missing_docs)]
//! Core components of classic reinforcement learning.
//!
//! This crate does not depend on any deep learning framework. It provides the
//! interfaces shared by all agents ([`Env`], [`Policy`], [`Agent`]), the episode
//! loop ([`Trainer`]), action selection ([`explorer`]), tabular agents
//! ([`tabular`]) and a fixed-capacity replay buffer ([`replay_buffer`]).
pub mod error;
pub mod explorer;
pub mod record;
pub mod replay_buffer;
pub mod tabular;
pub mod util;

mod base;
pub use base::{
    Act, Agent, BoxSpace, DiscreteAct, DiscreteSpace, Env, ExperienceBufferBase, Info, Obs,
    Policy, ReplayBufferBase, Step, Transition, VecObs,
};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{EpisodeStats, Trainer, TrainerConfig};
