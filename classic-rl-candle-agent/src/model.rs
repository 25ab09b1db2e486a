//! Interface of neural networks used in RL agents.
use anyhow::Result;
use candle_nn::VarBuilder;

/// Neural network model not owing its [`VarMap`] internally.
///
/// Agents own a [`VarMap`] per network and build the model from a [`VarBuilder`]
/// over it, so that the parameters can be optimized, copied and saved as a whole.
///
/// [`VarMap`]: candle_nn::VarMap
pub trait SubModel1 {
    /// Configuration from which [`SubModel1`] is constructed.
    type Config;

    /// Input of the [`SubModel1`].
    type Input;

    /// Output of the [`SubModel1`].
    type Output;

    /// Builds [`SubModel1`] with [`VarBuilder`] and [`SubModel1::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;
}
