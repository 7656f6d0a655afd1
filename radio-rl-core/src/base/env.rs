//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performs an environment step.
    ///
    /// The returned [`Record`] holds scalar diagnostics of the step.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Starts a new episode and returns its initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Starts a new episode determined by the given index.
    ///
    /// Evaluators call this with the episode number so that repeated
    /// evaluations see the same sequence of episodes.
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;
}
