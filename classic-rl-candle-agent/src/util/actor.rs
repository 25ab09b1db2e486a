//! Actor with categorical policy.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::log_softmax, ops::softmax, VarBuilder, VarMap};
use classic_rl_core::{error::RlError, util};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`CategoricalActor`].
pub struct CategoricalActorConfig<P> {
    /// Configuration of the policy network, which outputs action logits.
    pub policy_config: Option<P>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<P> Default for CategoricalActorConfig<P> {
    fn default() -> Self {
        Self {
            policy_config: None,
            opt_config: OptimizerConfig::Adam { lr: 0.001 },
        }
    }
}

impl<P> CategoricalActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for policy function.
    pub fn policy_config(mut self, v: P) -> Self {
        self.policy_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(pi_config) = &mut self.policy_config {
            pi_config.set_out_dim(v);
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
        if self.policy_config.is_none() {
            return Err(RlError::invalid_config("policy_config", "is not set"));
        }
        self.opt_config.validate()
    }

    /// Loads [`CategoricalActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        util::load_yaml(path)
    }

    /// Saves [`CategoricalActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        util::save_yaml(self, path)
    }
}

/// Actor with a categorical distribution over discrete actions.
///
/// The policy network outputs logits of shape `[batch_size, n_actions]`,
/// turned into probabilities with softmax.
pub struct CategoricalActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    device: Device,
    varmap: VarMap,

    // The number of actions.
    out_dim: usize,

    policy: P,
    opt: Optimizer,
}

impl<P> CategoricalActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`CategoricalActor`].
    pub fn build(config: CategoricalActorConfig<P::Config>, device: Device) -> Result<Self> {
        config.validate()?;
        let policy_config = config.policy_config.context("policy_config is not set.")?;
        let out_dim = policy_config.get_out_dim();
        let varmap = VarMap::new();
        let policy = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device).set_prefix("actor");
            P::build(vb, policy_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            out_dim,
            policy,
            opt,
        })
    }

    /// Returns action logits given observations.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        let logits = self.policy.forward(&obs.to_device(&self.device)?)?;
        debug_assert_eq!(logits.dims().len(), 2);
        debug_assert_eq!(logits.dims()[1], self.out_dim);
        Ok(logits)
    }

    /// Returns action probabilities, shape `[batch_size, n_actions]`.
    pub fn probs(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(softmax(&self.forward(obs)?, D::Minus1)?)
    }

    /// Returns the log probabilities of the given actions, shape `[batch_size]`.
    ///
    /// `act` is a tensor of action indices of type `u32` and shape `[batch_size]`.
    pub fn log_prob(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        let logp = log_softmax(&self.forward(obs)?, D::Minus1)?;
        let act = act.to_device(&self.device)?.unsqueeze(D::Minus1)?;
        Ok(logp.gather(&act, D::Minus1)?.squeeze(D::Minus1)?)
    }

    /// The number of actions.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Computes gradients of `loss` and updates the parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Parameters of the actor.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters as a safetensors file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save actor parameters to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from a safetensors file.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load actor parameters from {:?}", path.as_ref());
        Ok(())
    }
}
