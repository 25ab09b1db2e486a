//! REINFORCE agent.
mod base;
mod config;
pub use base::Reinforce;
pub use config::ReinforceConfig;
