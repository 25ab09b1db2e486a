//! Evaluate [`Policy`].
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate [`Policy`].
pub trait Evaluator<E: Env> {
    /// Evaluate [`Policy`].
    ///
    /// The caller of this method needs to handle the internal state of the policy,
    /// like training/evaluation mode.
    ///
    /// The returned record has the mean return under the key `"eval_return"`.
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E> + ?Sized;
}
