//! DDPG agent.
//!
//! The agent keeps live and target copies of a deterministic actor and a
//! critic, each in its own [`VarMap`](candle_nn::VarMap). One optimization
//! step does, in order:
//!
//! 1. nothing if the replay buffer holds fewer transitions than one batch;
//! 2. sample a batch `(s, a, r, s')` uniformly without replacement;
//! 3. compute `y = r + gamma * Q'(s', mu'(s'))` with the target networks,
//!    detached from the autograd graph;
//! 4. regress `Q(s, a)` on `y` and step the critic optimizer;
//! 5. step the actor optimizer on `-mean(Q(s, mu(s)))`, leaving the critic
//!    parameters untouched;
//! 6. soft-update both targets, `theta' <- tau * theta + (1 - tau) * theta'`.
//!
//! Transitions carry no terminal flag; the environment is non-episodic.
mod actor;
mod base;
mod config;
mod critic;
mod explorer;
pub use actor::{DeterministicActor, DeterministicActorConfig};
pub use base::Ddpg;
pub use config::DdpgConfig;
pub use critic::{Critic, CriticConfig};
pub use explorer::GaussianNoise;
