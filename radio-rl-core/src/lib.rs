#![warn(missing_docs)]
//! Core components of radio resource allocation agents.
//!
//! This crate defines the interfaces shared by environments and agents,
//! [`Env`], [`Policy`] and [`Agent`], a ring [`ReplayBuffer`](replay_buffer::ReplayBuffer)
//! with uniform sampling, the episode-based [`Trainer`] and evaluators.
//! Neural networks live in backend crates; the wireless environment lives in
//! its own crate.
pub mod error;
pub mod evaluator;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase,
    Step, StepProcessor, TransitionBatch,
};

pub mod trainer;
pub use evaluator::{DefaultEvaluator, Evaluator};
pub use trainer::{Sampler, Trainer, TrainerConfig};

#[cfg(test)]
mod dummy;
