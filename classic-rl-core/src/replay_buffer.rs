//! A fixed-capacity replay buffer.
mod base;
mod batch;
mod config;
pub use base::SimpleReplayBuffer;
pub use batch::TransitionBatch;
pub use config::SimpleReplayBufferConfig;
