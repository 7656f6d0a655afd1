//! Interaction of an agent with the training environment.
use crate::{record::Record, Agent, Env, ExperienceBufferBase, StepProcessor};
use anyhow::{anyhow, Result};

/// The result of one environment step taken by [`Sampler`].
pub struct Sample {
    /// Diagnostics returned by the environment.
    pub record: Record,

    /// Reward of the step.
    pub reward: f32,

    /// Whether the episode ended with this step.
    pub is_done: bool,
}

/// Runs an agent on the training environment and pushes the resulting
/// transitions into the agent's replay buffer.
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,
    prev_obs: Option<E::Obs>,
    step_processor: P,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a sampler.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
        }
    }

    /// Returns the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Starts a new episode.
    pub fn reset(&mut self) -> Result<()> {
        let obs = self.env.reset()?;
        self.step_processor.reset(obs.clone());
        self.prev_obs = Some(obs);
        Ok(())
    }

    /// Takes an action sampled from the agent, steps the environment and
    /// stores the transition with [`Agent::save_experience`].
    ///
    /// Starts an episode first if none is running.
    pub fn sample_and_push<A>(&mut self, agent: &mut A) -> Result<Sample>
    where
        A: Agent<E>,
        A::Buffer: ExperienceBufferBase<Item = P::Output>,
    {
        if self.prev_obs.is_none() {
            self.reset()?;
        }
        let obs = self
            .prev_obs
            .as_ref()
            .ok_or_else(|| anyhow!("no observation to act on"))?;

        let act = agent.sample(obs)?;
        let (step, record) = self.env.step(&act)?;
        let reward = step.reward;
        let is_done = step.is_done();
        self.prev_obs = if is_done { None } else { Some(step.obs.clone()) };

        let transition = self.step_processor.process(step)?;
        agent.save_experience(transition)?;

        Ok(Sample {
            record,
            reward,
            is_done,
        })
    }
}
