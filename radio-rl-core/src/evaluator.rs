//! Evaluate policies.
use crate::{record::Record, Env, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluates a policy.
///
/// The returned record must hold the scalar
/// [`EVAL_REWARD_KEY`](crate::trainer::EVAL_REWARD_KEY), which the
/// [`Trainer`](crate::Trainer) uses to pick the best model.
pub trait Evaluator<E: Env> {
    /// Evaluates `policy`.
    ///
    /// The caller of this method needs to handle the internal state of the
    /// policy, like training/evaluation mode.
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record>;
}
