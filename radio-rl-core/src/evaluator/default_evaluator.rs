use super::Evaluator;
use crate::{record::Record, trainer::EVAL_REWARD_KEY, Env, Policy};
use anyhow::Result;

/// Runs a fixed number of episodes and reports the mean return.
///
/// Episode `ix` starts from [`Env::reset_with_index`] and ends when the
/// environment reports done or after `max_steps` steps.
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    max_steps: usize,
    env: E,
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P: Policy<E>>(&mut self, policy: &mut P) -> Result<Record> {
        let mut r_total = 0f32;

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;

            for _ in 0..self.max_steps {
                let act = policy.sample(&prev_obs)?;
                let (step, _) = self.env.step(&act)?;
                r_total += step.reward;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }
        }

        Ok(Record::from_scalar(
            EVAL_REWARD_KEY,
            r_total / self.n_episodes.max(1) as f32,
        ))
    }
}

impl<E: Env> DefaultEvaluator<E> {
    /// Builds the evaluation environment.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize, max_steps: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_steps,
            env: E::build(config, seed)?,
        })
    }
}
