//! Environment step.
use super::Env;
use anyhow::Result;

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// The outcome `(a_t, o_t+1, r_t)` of one interaction with an environment.
///
/// Combined with the previous observation it forms a transition
/// `(o_t, a_t, r_t, o_t+1)`; see [`StepProcessor`].
pub struct Step<E: Env> {
    /// Action.
    pub act: E::Act,

    /// Observation after the action.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode reached a terminal state.
    pub is_terminated: bool,

    /// Flag denoting if the episode was cut by a step budget.
    pub is_truncated: bool,

    /// Information defined by the environment.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        act: E::Act,
        reward: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            act,
            obs,
            reward,
            is_terminated,
            is_truncated,
            info,
        }
    }

    /// Terminated or truncated.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}

/// Turns a [`Step`] into an item pushed to a replay buffer.
///
/// [`Self::Output`] is expected to be the item type of the agent's buffer,
/// [`ExperienceBufferBase::Item`](crate::ExperienceBufferBase::Item).
///
/// [`Self::Output`]: StepProcessor::Output
pub trait StepProcessor<E: Env> {
    /// Configuration.
    type Config: Clone;

    /// The type of transitions produced by this trait.
    type Output;

    /// Builds a processor.
    fn build(config: &Self::Config) -> Self;

    /// Starts a new episode from its initial observation.
    fn reset(&mut self, init_obs: E::Obs);

    /// Processes a [`Step`] object.
    ///
    /// Fails if [`reset`](StepProcessor::reset) has not been called.
    fn process(&mut self, step: Step<E>) -> Result<Self::Output>;
}
