//! Configuration of DQN agent.
use super::DqnModelConfig;
use crate::{util::CriticLoss, util::OutDim, Device};
use anyhow::Result;
use classic_rl_core::{
    error::RlError, explorer::EpsilonGreedy, replay_buffer::SimpleReplayBufferConfig, util,
};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`Dqn`](super::Dqn).
///
/// `Q` is the configuration type of the action-value network.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q> {
    /// Configuration of the online and target networks.
    pub model_config: DqnModelConfig<Q>,

    /// The number of transitions in a minibatch.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f32,

    /// Interval of target network updates in environment steps.
    pub target_update_interval: usize,

    /// Soft update coefficient. The target network is overwritten by the online
    /// network if `None`.
    #[serde(default)]
    pub tau: Option<f64>,

    /// Configuration of the replay buffer.
    pub replay_buffer_config: SimpleReplayBufferConfig,

    /// Explorer used in training mode.
    pub explorer: EpsilonGreedy,

    /// Loss between predicted and target action values.
    pub critic_loss: CriticLoss,

    /// Random seed for action selection.
    pub seed: u64,

    /// Device.
    pub device: Option<Device>,
}

impl<Q> Default for DqnConfig<Q> {
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 64,
            discount_factor: 0.99,
            target_update_interval: 500,
            tau: None,
            replay_buffer_config: SimpleReplayBufferConfig::default(),
            explorer: EpsilonGreedy::with_final_step(10_000),
            critic_loss: CriticLoss::Mse,
            seed: 42,
            device: None,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, model_config: DqnModelConfig<Q>) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the output dimention of the dqn model of the DQN agent.
    pub fn out_dim(mut self, out_dim: usize) -> Self {
        self.model_config = self.model_config.out_dim(out_dim);
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Interval of target network updates in environment steps.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = Some(v);
        self
    }

    /// Replay buffer.
    pub fn replay_buffer_config(mut self, v: SimpleReplayBufferConfig) -> Self {
        self.replay_buffer_config = v;
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    /// Checks the hyperparameters.
    pub fn validate(&self) -> Result<(), RlError> {
        self.model_config.validate()?;
        self.replay_buffer_config.validate()?;
        self.explorer.validate()?;
        if self.batch_size == 0 {
            return Err(RlError::invalid_config("batch_size", "must be positive"));
        }
        let capacity = self.replay_buffer_config.get_capacity();
        if self.batch_size > capacity {
            return Err(RlError::invalid_config(
                "batch_size",
                format!(
                    "{} exceeds the replay buffer capacity {}, training would never start",
                    self.batch_size, capacity
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(RlError::invalid_config(
                "discount_factor",
                format!("{} is not in [0, 1]", self.discount_factor),
            ));
        }
        if self.target_update_interval == 0 {
            return Err(RlError::invalid_config(
                "target_update_interval",
                "must be positive",
            ));
        }
        if let Some(tau) = self.tau {
            if !(tau > 0.0 && tau <= 1.0) {
                return Err(RlError::invalid_config(
                    "tau",
                    format!("{} is not in (0, 1]", tau),
                ));
            }
        }
        Ok(())
    }

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = util::load_yaml(path)?;
        info!("Load config of DQN agent from {:?}", path);
        Ok(config)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        util::save_yaml(self, path)?;
        info!("Save config of DQN agent into {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::MlpConfig, opt::OptimizerConfig};
    use tempdir::TempDir;

    fn config() -> DqnConfig<MlpConfig> {
        DqnConfig::default()
            .model_config(
                DqnModelConfig::default()
                    .q_config(MlpConfig::new(4, vec![64, 64], 2, false))
                    .opt_config(OptimizerConfig::Adam { lr: 0.0005 }),
            )
            .batch_size(32)
            .replay_buffer_config(SimpleReplayBufferConfig::default().capacity(1000))
            .device(Device::Cpu)
    }

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let config = config().critic_loss(CriticLoss::SmoothL1).tau(0.01);
        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        config.save(&path)?;
        let config_ = DqnConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());
        assert!(config().batch_size(0).validate().is_err());
        assert!(config().batch_size(2000).validate().is_err());
        assert!(config().target_update_interval(0).validate().is_err());
        assert!(config().discount_factor(1.1).validate().is_err());
        assert!(config().tau(0.0).validate().is_err());
        let lr0 = DqnModelConfig::default()
            .q_config(MlpConfig::new(4, vec![8], 2, false))
            .opt_config(OptimizerConfig::Adam { lr: 0.0 });
        assert!(config().model_config(lr0).validate().is_err());
        assert!(DqnConfig::<MlpConfig>::default().validate().is_err());
    }
}
