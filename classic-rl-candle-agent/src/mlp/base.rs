use super::{mlp_forward, MlpConfig};
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Tensor};
use classic_rl_core::error::RlError;
use candle_nn::{linear, Linear, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter().copied());
    dims.push(config.out_dim);
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, w)| Ok(linear(w[0], w[1], vs.pp(format!("ln{}", i)))?))
        .collect()
}

/// Multilayer perceptron with ReLU activation function.
///
/// Inputs are tensors of shape `[batch_size, in_dim]`. Any other width fails with
/// [`RlError::ObsDimMismatch`].
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let (_, in_dim) = xs.dims2()?;
        if in_dim != self.config.in_dim {
            return Err(RlError::ObsDimMismatch {
                expected: self.config.in_dim,
                got: in_dim,
            }
            .into());
        }
        let xs = xs.to_device(&self.device)?;
        let xs = mlp_forward(xs, &self.layers)?;

        match self.config.activation_out {
            false => Ok(xs),
            true => Ok(xs.relu()?),
        }
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        config.validate()?;
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_mlp_shapes() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::build(vb, MlpConfig::new(4, vec![16, 8], 2, false))?;
        // three layers of weights and biases
        assert_eq!(varmap.all_vars().len(), 6);

        let xs = Tensor::zeros((5, 4), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[5, 2]);
        Ok(())
    }

    #[test]
    fn test_mlp_without_hidden_layer() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::build(vb, MlpConfig::new(3, vec![], 1, true))?;
        let xs = Tensor::ones((2, 3), DType::F32, &Device::Cpu)?;
        let ys = mlp.forward(&xs)?.flatten_all()?.to_vec1::<f32>()?;
        assert!(ys.iter().all(|y| *y >= 0.0));
        Ok(())
    }

    #[test]
    fn test_mlp_rejects_wrong_input_width() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::build(vb, MlpConfig::new(1, vec![8], 2, false))?;
        let xs = Tensor::zeros((1, 2), DType::F32, &Device::Cpu)?;
        let err = mlp.forward(&xs).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RlError>(),
            Some(&RlError::ObsDimMismatch {
                expected: 1,
                got: 2
            })
        );
        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        assert!(Mlp::build(vb, MlpConfig::new(3, vec![0], 1, false)).is_err());
    }
}
