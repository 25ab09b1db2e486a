//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarMap;
use classic_rl_core::{error::RlError, Obs};
use log::trace;
use serde::{Deserialize, Serialize};
mod actor;
mod critic;
pub use actor::{CategoricalActor, CategoricalActorConfig};
pub use critic::{ValueCritic, ValueCriticConfig};

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track, tau = {}", tau);
    let dest = dest.data().lock().map_err(|e| anyhow!("{}", e))?;
    let src = src.data().lock().map_err(|e| anyhow!("{}", e))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("variable {} is not found in the source", k_dest))?;
        let t_dest = ((tau * v_src.as_tensor())? + (1.0 - tau) * v_dest.as_tensor())?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Copies all variables of `src` into `dest`.
///
/// Variables are identified by their names. After this call, `dest` holds a
/// snapshot of `src`: later updates of `src` do not affect `dest`.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    trace!("hard update");
    let dest = dest.data().lock().map_err(|e| anyhow!("{}", e))?;
    let src = src.data().lock().map_err(|e| anyhow!("{}", e))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("variable {} is not found in the source", k_dest))?;
        v_dest.set(v_src.as_tensor())?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = (1.0 - &m1)?;
    (((0.5 * m1)? * d.powf(2.0))? + m2 * (d - 0.5))?.mean_all()
}

/// Stacks observations into a tensor of shape `[batch_size, obs_dim]`.
///
/// `obs_dim` is the length of the first observation. Any other length fails with
/// [`RlError::ObsDimMismatch`].
pub fn obs_to_tensor<'a, O, I>(obs: I, device: &Device) -> Result<Tensor>
where
    O: Obs + 'a,
    I: IntoIterator<Item = &'a O>,
{
    let mut data = vec![];
    let mut batch_size = 0;
    let mut obs_dim = None;
    for o in obs {
        let o = o.as_slice();
        let expected = *obs_dim.get_or_insert(o.len());
        if o.len() != expected {
            return Err(RlError::ObsDimMismatch {
                expected,
                got: o.len(),
            }
            .into());
        }
        data.extend_from_slice(o);
        batch_size += 1;
    }
    match obs_dim {
        None => Err(anyhow!("no observation is given")),
        Some(obs_dim) => Ok(Tensor::from_vec(data, (batch_size, obs_dim), device)?),
    }
}

/// Flattens all variables of a [`VarMap`], sorted by name.
pub fn flatten_vars(varmap: &VarMap) -> Result<Vec<(String, Vec<f32>)>> {
    let data = varmap.data().lock().map_err(|e| anyhow!("{}", e))?;
    let mut vars = data
        .iter()
        .map(|(k, v)| Ok((k.clone(), v.as_tensor().flatten_all()?.to_vec1::<f32>()?)))
        .collect::<Result<Vec<_>>>()?;
    vars.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::Init;

    fn varmap(values: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((3,), "var1", init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(values, (3,), &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        Ok(vm)
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let vm_src = varmap(&[1.0, 2.0, 3.0])?;
        let vm_dest = varmap(&[4.0, 5.0, 6.0])?;
        track(&vm_dest, &vm_src, tau)?;

        let expected = [1.9f32, 2.9, 3.9];
        let actual = &flatten_vars(&vm_dest)?[0].1;
        for (e, a) in expected.iter().zip(actual.iter()) {
            assert!((e - a).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_hard_update_is_a_snapshot() -> Result<()> {
        let vm_src = varmap(&[1.0, 2.0, 3.0])?;
        let vm_dest = varmap(&[4.0, 5.0, 6.0])?;
        hard_update(&vm_dest, &vm_src)?;
        assert_eq!(flatten_vars(&vm_dest)?, flatten_vars(&vm_src)?);

        let t = Tensor::from_slice(&[0f32, 0.0, 0.0], (3,), &Device::Cpu)?;
        vm_src.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        assert_eq!(flatten_vars(&vm_dest)?[0].1, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0f32, 0.0], (2,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.5f32, 3.0], (2,), &Device::Cpu)?;
        // (0.5 * 0.25 + (3.0 - 0.5)) / 2
        let loss = smooth_l1_loss(&x, &y)?.to_scalar::<f32>()?;
        assert!((loss - 1.3125).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_obs_to_tensor() -> Result<()> {
        use classic_rl_core::VecObs;
        let obs = vec![VecObs(vec![1.0, 2.0]), VecObs(vec![3.0, 4.0])];
        let t = obs_to_tensor(&obs, &Device::Cpu)?;
        assert_eq!(t.dims(), &[2, 2]);
        assert_eq!(t.to_vec2::<f32>()?, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        Ok(())
    }

    #[test]
    fn test_obs_to_tensor_ragged() {
        use classic_rl_core::VecObs;
        let obs = vec![VecObs(vec![]), VecObs(vec![0.3, 0.7])];
        let err = obs_to_tensor(&obs, &Device::Cpu).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RlError>(),
            Some(&RlError::ObsDimMismatch {
                expected: 0,
                got: 2
            })
        );
    }
}
