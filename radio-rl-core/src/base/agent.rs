//! Agent.
use super::{Env, ExperienceBufferBase, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Represents a trainable policy on an environment.
///
/// The agent owns its replay buffer. Transitions enter it through
/// [`save_experience`](Agent::save_experience) and are consumed by
/// [`opt_with_record`](Agent::opt_with_record).
pub trait Agent<E: Env>: Policy<E> {
    /// The replay buffer owned by the agent.
    type Buffer: ExperienceBufferBase + ReplayBufferBase;

    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Returns the replay buffer.
    fn buffer(&self) -> &Self::Buffer;

    /// Stores a transition in the replay buffer.
    fn save_experience(
        &mut self,
        tr: <Self::Buffer as ExperienceBufferBase>::Item,
    ) -> Result<()>;

    /// Performs an optimization step.
    fn opt(&mut self) -> Result<()> {
        self.opt_with_record().map(|_| ())
    }

    /// Performs an optimization step and returns some information.
    ///
    /// Returns `Ok(None)` without touching any parameter when the replay
    /// buffer holds fewer transitions than one batch.
    fn opt_with_record(&mut self) -> Result<Option<Record>>;

    /// Saves the parameters of the agent in the given directory and
    /// returns the paths of the written files.
    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Loads the parameters of the agent from the given directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
