//! Configuration of Actor-Critic agent.
use crate::{
    util::{CategoricalActorConfig, OutDim, ValueCriticConfig},
    Device,
};
use anyhow::Result;
use classic_rl_core::{error::RlError, util};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`ActorCritic`](super::ActorCritic).
///
/// `P` and `V` are the configuration types of the policy and the value networks.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig<P, V> {
    /// Configuration of the actor.
    pub actor_config: CategoricalActorConfig<P>,

    /// Configuration of the critic.
    pub critic_config: ValueCriticConfig<V>,

    /// Discount factor.
    pub discount_factor: f32,

    /// Random seed for action sampling.
    pub seed: u64,

    /// Device.
    pub device: Option<Device>,
}

impl<P, V> Default for ActorCriticConfig<P, V> {
    fn default() -> Self {
        Self {
            actor_config: CategoricalActorConfig::default(),
            critic_config: ValueCriticConfig::default(),
            discount_factor: 0.99,
            seed: 42,
            device: None,
        }
    }
}

impl<P, V> ActorCriticConfig<P, V>
where
    P: DeserializeOwned + Serialize + OutDim,
    V: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the actor.
    pub fn actor_config(mut self, v: CategoricalActorConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Sets the configuration of the critic.
    pub fn critic_config(mut self, v: ValueCriticConfig<V>) -> Self {
        self.critic_config = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
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
        self.actor_config.validate()?;
        self.critic_config.validate()?;
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(RlError::invalid_config(
                "discount_factor",
                format!("{} is not in [0, 1]", self.discount_factor),
            ));
        }
        Ok(())
    }

    /// Loads [`ActorCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = util::load_yaml(path)?;
        info!("Load config of Actor-Critic agent from {:?}", path);
        Ok(config)
    }

    /// Saves [`ActorCriticConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        util::save_yaml(self, path)?;
        info!("Save config of Actor-Critic agent into {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::MlpConfig, opt::OptimizerConfig};
    use tempdir::TempDir;

    fn config() -> ActorCriticConfig<MlpConfig, MlpConfig> {
        ActorCriticConfig::default()
            .actor_config(
                CategoricalActorConfig::default()
                    .policy_config(MlpConfig::new(4, vec![32], 2, false))
                    .opt_config(OptimizerConfig::Adam { lr: 0.001 }),
            )
            .critic_config(
                ValueCriticConfig::default()
                    .value_config(MlpConfig::new(4, vec![32], 1, false))
                    .opt_config(OptimizerConfig::Adam { lr: 0.005 }),
            )
            .device(Device::Cpu)
    }

    #[test]
    fn test_serde_actor_critic_config() -> Result<()> {
        let config = config();
        let dir = TempDir::new("actor_critic_config")?;
        let path = dir.path().join("actor_critic_config.yaml");
        config.save(&path)?;
        let config_ = ActorCriticConfig::<MlpConfig, MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());
        assert!(config().discount_factor(-0.1).validate().is_err());
        let critic = ValueCriticConfig::default().value_config(MlpConfig::new(4, vec![32], 2, false));
        assert!(config().critic_config(critic).validate().is_err());
        assert!(ActorCriticConfig::<MlpConfig, MlpConfig>::default()
            .validate()
            .is_err());
    }
}
