//! Conversion of environment steps into transitions.
use super::{BatchBase, GenericTransitionBatch};
use crate::{Env, Step, StepProcessor};
use anyhow::{anyhow, Result};
use std::{default::Default, marker::PhantomData};

/// Configuration of [`SimpleStepProcessor`].
#[derive(Clone, Debug, Default)]
pub struct SimpleStepProcessorConfig {}

/// Builds one-step transitions `(o_t, a_t, r_t, o_t+1)`.
///
/// The processor keeps the last observation; [`Step`] objects carry only
/// `o_t+1`.
pub struct SimpleStepProcessor<E, O, A> {
    prev_obs: Option<O>,
    phantom: PhantomData<(E, A)>,
}

impl<E, O, A> StepProcessor<E> for SimpleStepProcessor<E, O, A>
where
    E: Env,
    O: BatchBase + From<E::Obs>,
    A: BatchBase + From<E::Act>,
{
    type Config = SimpleStepProcessorConfig;
    type Output = GenericTransitionBatch<O, A>;

    fn build(_config: &Self::Config) -> Self {
        Self {
            prev_obs: None,
            phantom: PhantomData,
        }
    }

    fn reset(&mut self, init_obs: E::Obs) {
        self.prev_obs = Some(init_obs.into());
    }

    fn process(&mut self, step: Step<E>) -> Result<Self::Output> {
        let next_obs = step.obs.clone().into();
        let obs = self
            .prev_obs
            .replace(step.obs.into())
            .ok_or_else(|| anyhow!("prev_obs is not set. Forgot to call reset()?"))?;

        Ok(GenericTransitionBatch {
            obs,
            act: step.act.into(),
            next_obs,
            reward: vec![step.reward],
            ix_sample: None,
        })
    }
}
