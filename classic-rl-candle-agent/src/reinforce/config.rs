//! Configuration of REINFORCE agent.
use crate::{util::CategoricalActorConfig, util::OutDim, Device};
use anyhow::Result;
use classic_rl_core::{error::RlError, util};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

/// Configuration of [`Reinforce`](super::Reinforce).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReinforceConfig<P> {
    /// Configuration of the policy network.
    pub actor_config: CategoricalActorConfig<P>,

    /// Discount factor.
    pub discount_factor: f32,

    /// Random seed for action sampling.
    pub seed: u64,

    /// Device.
    pub device: Option<Device>,
}

impl<P> Default for ReinforceConfig<P> {
    fn default() -> Self {
        Self {
            actor_config: CategoricalActorConfig::default(),
            discount_factor: 0.99,
            seed: 42,
            device: None,
        }
    }
}

impl<P> ReinforceConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the policy network.
    pub fn actor_config(mut self, v: CategoricalActorConfig<P>) -> Self {
        self.actor_config = v;
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
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(RlError::invalid_config(
                "discount_factor",
                format!("{} is not in [0, 1]", self.discount_factor),
            ));
        }
        Ok(())
    }

    /// Loads [`ReinforceConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = util::load_yaml(path)?;
        info!("Load config of REINFORCE agent from {:?}", path);
        Ok(config)
    }

    /// Saves [`ReinforceConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        util::save_yaml(self, path)?;
        info!("Save config of REINFORCE agent into {:?}", path);
        Ok(())
    }
}
