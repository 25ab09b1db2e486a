//! Multilayer perceptron.
mod base;
mod config;
use anyhow::{Context, Result};
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::MlpConfig;

fn mlp_forward(xs: Tensor, layers: &[Linear]) -> Result<Tensor> {
    let (last, hidden) = layers.split_last().context("MLP has no layer")?;
    let mut xs = xs;
    for layer in hidden {
        xs = layer.forward(&xs)?.relu()?;
    }
    Ok(last.forward(&xs)?)
}
