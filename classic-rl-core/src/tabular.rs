//! Tabular agents.
//!
//! Continuous observations are mapped to grid cells by a [`Discretizer`] and action
//! values are stored in a dense [`QTable`] with one axis per observation dimension
//! plus one axis for actions. [`Sarsa`] bootstraps from the action it will actually
//! take next, [`QLearning`] from the greedy action.
//!
//! Large learning rates or reward scales can make the table values grow without
//! bound. This is not detected.
mod base;
mod config;
mod discretizer;
mod q_learning;
mod q_table;
mod sarsa;
mod target;
#[cfg(test)]
mod test_env;
pub use config::{DiscretizerBounds, TabularConfig};
pub use discretizer::Discretizer;
pub use q_learning::QLearning;
pub use q_table::QTable;
pub use sarsa::Sarsa;
pub use target::{q_learning_target, sarsa_target};
