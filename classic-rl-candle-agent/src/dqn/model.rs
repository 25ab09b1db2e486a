use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use classic_rl_core::{error::RlError, util};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DqnModel`].
pub struct DqnModelConfig<Q> {
    pub(super) q_config: Option<Q>,
    pub(super) opt_config: OptimizerConfig,
}

impl<Q> Default for DqnModelConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> DqnModelConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(q_config) = &mut self.q_config {
            q_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), RlError> {
        if self.q_config.is_none() {
            return Err(RlError::invalid_config("q_config", "is not set"));
        }
        self.opt_config.validate()
    }

    /// Constructs [`DqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        util::load_yaml(path)
    }

    /// Saves [`DqnModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        util::save_yaml(self, path)
    }
}

/// Action-value function with its optimizer.
pub struct DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim,
{
    varmap: VarMap,

    // Dimension of the output vector (equal to the number of actions).
    pub(super) out_dim: usize,

    // Action-value function
    q: Q,

    // Optimizer
    opt: Optimizer,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DqnModel`].
    pub fn build(config: DqnModelConfig<Q::Config>, device: Device) -> Result<Self> {
        config.validate()?;
        let q_config = config.q_config.context("q_config is not set.")?;
        let out_dim = q_config.get_out_dim();
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Q::build(vb, q_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            out_dim,
            q,
            opt,
        })
    }

    /// Outputs the action-value given observation(s), shape `[batch_size, n_actions]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        self.q.forward(obs)
    }

    /// Computes gradients of `loss` and updates the parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Parameters of the model.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters as a safetensors file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save dqnmodel to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from a safetensors file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load dqnmodel from {:?}", path.as_ref());
        Ok(())
    }
}
