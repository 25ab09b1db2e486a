//! Optimizers.
use anyhow::Result;
use candle_core::{backprop::GradStore, Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use classic_rl_core::error::RlError;
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Decay rate of the second moment.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Term added to the denominator.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// Constructs an optimizer over the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        self.validate()?;
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars, params)?;
                Ok(Optimizer::AdamW(opt))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }

    /// Learning rate.
    pub fn get_learning_rate(&self) -> f64 {
        match self {
            Self::AdamW { lr, .. } => *lr,
            Self::Adam { lr } => *lr,
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
        }
    }

    /// Checks that the learning rate is positive.
    pub fn validate(&self) -> Result<(), RlError> {
        let lr = self.get_learning_rate();
        if !(lr > 0.0 && lr.is_finite()) {
            return Err(RlError::invalid_config(
                "learning rate",
                format!("{} is not positive", lr),
            ));
        }
        Ok(())
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 0.001 }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of the optimizers of [`candle_nn`] and [`candle_optimisers`].
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW),

    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Computes gradients of `loss` and applies them.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }

    /// Applies precomputed gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.step(grads)?),
            Self::Adam(opt) => Ok(opt.step(grads)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn test_learning_rate_must_be_positive() {
        assert!(OptimizerConfig::Adam { lr: 0.0 }.validate().is_err());
        assert!(OptimizerConfig::default()
            .learning_rate(-1e-3)
            .validate()
            .is_err());
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_backward_step_decreases_loss() -> Result<()> {
        let x = Var::zeros(3, DType::F32, &Device::Cpu)?;
        let mut opt = OptimizerConfig::Adam { lr: 0.1 }.build(vec![x.clone()])?;
        let target = Tensor::new(&[1f32, 2.0, 3.0], &Device::Cpu)?;
        let loss = |x: &Var| -> Result<f32> {
            Ok(x.as_tensor().sub(&target)?.sqr()?.sum_all()?.to_scalar()?)
        };
        let l0 = loss(&x)?;
        for _ in 0..10 {
            let l = x.as_tensor().sub(&target)?.sqr()?.sum_all()?;
            opt.backward_step(&l)?;
        }
        assert!(loss(&x)? < l0);
        Ok(())
    }

    #[test]
    fn test_step_with_precomputed_gradients() -> Result<()> {
        let x = Var::zeros(2, DType::F32, &Device::Cpu)?;
        let config = OptimizerConfig::AdamW {
            lr: 0.1,
            beta1: default_beta1(),
            beta2: default_beta2(),
            eps: default_eps(),
            weight_decay: 0.0,
        };
        let mut opt = config.build(vec![x.clone()])?;
        let loss = x.as_tensor().sum_all()?;
        opt.step(&loss.backward()?)?;
        // descending along a positive gradient
        let v = x.as_tensor().to_vec1::<f32>()?;
        assert!(v.iter().all(|&e| e < 0.0));
        Ok(())
    }
}
