//! A ring replay buffer with uniform sampling.
//!
//! [`ReplayBuffer`] stores transitions column by column: observations,
//! actions and next observations each live in a [`BatchBase`] store and
//! rewards in a plain vector. Once `capacity` transitions have been pushed,
//! each push overwrites the oldest one. [`ReplayBuffer::batch`] draws indices
//! uniformly without replacement, so a batch never holds the same transition
//! twice.
//!
//! [`ArrayBatch`] is the row-major `f32` store used for vector observations
//! and actions. [`SimpleStepProcessor`] turns environment steps into
//! [`GenericTransitionBatch`] items by remembering the previous observation.
mod array_batch;
mod base;
mod batch;
mod config;
mod step_proc;
pub use array_batch::ArrayBatch;
pub use base::ReplayBuffer;
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::ReplayBufferConfig;
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
