//! Environments implementing [`classic_rl_core::Env`].
//!
//! * [`CartPole`]: the classic pole balancing task.
//! * [`TwoStateMdp`]: a deterministic two-state MDP with a known optimal policy,
//!   useful for checking that an agent learns anything at all.
mod cart_pole;
mod two_state_mdp;
pub use cart_pole::{CartPole, CartPoleConfig};
pub use two_state_mdp::{TwoStateMdp, TwoStateMdpConfig};
