//! Neural network agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`dqn::Dqn`]: action-value network with a target network and a replay buffer.
//! * [`reinforce::Reinforce`]: Monte-Carlo policy gradient.
//! * [`actor_critic::ActorCritic`]: one-step actor-critic with a state-value critic.
pub mod actor_critic;
pub mod dqn;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod reinforce;
pub mod util;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
