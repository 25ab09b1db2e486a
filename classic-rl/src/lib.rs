//! Classic reinforcement learning algorithms in Rust.
//!
//! The workspace consists of the following crates:
//!
//! * [`classic_rl_core`] provides the traits shared by environments and agents,
//!   the episode loop, evaluation, records, explorers, a replay buffer and the
//!   tabular agents (SARSA and Q-learning).
//! * [`classic_rl_candle_agent`] includes neural agents based on
//!   [candle](https://crates.io/crates/candle-core): DQN, REINFORCE and one-step
//!   actor-critic.
//! * [`classic_rl_env`] has native environments, cart-pole and a two-state MDP.
//!
//! This crate re-exports them and hosts the example programs under `examples/`.
//! Each example trains an agent on cart-pole and evaluates the best model:
//!
//! ```bash
//! cargo run --release --example q_learning_cartpole -- --train --episodes 2000
//! cargo run --release --example q_learning_cartpole -- --eval
//! ```
pub use classic_rl_candle_agent;
pub use classic_rl_core;
pub use classic_rl_env;
