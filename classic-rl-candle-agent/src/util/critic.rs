//! State-value critic.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use classic_rl_core::{error::RlError, util};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`ValueCritic`].
pub struct ValueCriticConfig<V> {
    /// Configuration of the value network. Its output dimension must be 1.
    pub value_config: Option<V>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<V> Default for ValueCriticConfig<V> {
    fn default() -> Self {
        Self {
            value_config: None,
            opt_config: OptimizerConfig::Adam { lr: 0.001 },
        }
    }
}

impl<V> ValueCriticConfig<V>
where
    V: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for the value function.
    pub fn value_config(mut self, v: V) -> Self {
        self.value_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), RlError> {
        match &self.value_config {
            None => return Err(RlError::invalid_config("value_config", "is not set")),
            Some(c) if c.get_out_dim() != 1 => {
                return Err(RlError::invalid_config(
                    "value_config",
                    format!("output dimension is {}, expected 1", c.get_out_dim()),
                ))
            }
            _ => {}
        }
        self.opt_config.validate()
    }

    /// Loads [`ValueCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        util::load_yaml(path)
    }

    /// Saves [`ValueCriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        util::save_yaml(self, path)
    }
}

/// State-value function `V(s)` with its own optimizer.
pub struct ValueCritic<V>
where
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    varmap: VarMap,
    value: V,
    opt: Optimizer,
}

impl<V> ValueCritic<V>
where
    V: SubModel1<Input = Tensor, Output = Tensor>,
    V::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`ValueCritic`].
    pub fn build(config: ValueCriticConfig<V::Config>, device: Device) -> Result<Self> {
        config.validate()?;
        let value_config = config.value_config.context("value_config is not set.")?;
        let varmap = VarMap::new();
        let value = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device).set_prefix("critic");
            V::build(vb, value_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            value,
            opt,
        })
    }

    /// Returns state values of shape `[batch_size]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        let v = self.value.forward(&obs.to_device(&self.device)?)?;
        Ok(v.squeeze(D::Minus1)?)
    }

    /// Computes gradients of `loss` and updates the parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Parameters of the critic.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters as a safetensors file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save critic parameters to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from a safetensors file.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load critic parameters from {:?}", path.as_ref());
        Ok(())
    }
}
