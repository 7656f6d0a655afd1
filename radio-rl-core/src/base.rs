//! Core traits of environments, policies, agents and replay buffers.
mod agent;
mod batch;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use batch::TransitionBatch;
pub use env::Env;
pub use policy::{Configurable, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::{Info, Step, StepProcessor};

/// An observation of an environment.
pub trait Obs: Clone + Debug {
    /// Returns the dimension of the observation vector.
    fn len(&self) -> usize;
}

/// An action on an environment.
pub trait Act: Clone + Debug {
    /// Returns the dimension of the action vector.
    fn len(&self) -> usize;
}
