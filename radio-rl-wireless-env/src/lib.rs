//! A simulated single-cell wireless network as an [`Env`](radio_rl_core::Env).
//!
//! A base station serves between `min_users` and `max_users` users. Each step
//! the policy chooses, for every active user, a resource-block share and a
//! normalized transmit power. The environment answers with the throughput,
//! delay, packet loss and energy efficiency of every user and a scalar reward
//! trading throughput against power, delay and loss.
//!
//! Observations and actions have a fixed length regardless of the number of
//! active users:
//!
//! * [`WirelessObs`] has `4 * max_users` entries. The first `4 * current_users`
//!   hold the blocks `[channel quality | QoS demand | load | interference]`,
//!   each of length `current_users`; the rest are zero.
//! * [`WirelessAct`] has `2 * max_users` entries. Resource-block shares are at
//!   `[0, current_users)` and power levels at
//!   `[max_users, max_users + current_users)`.
//!
//! The crate also provides heuristic [`Scheduler`]s and a [`QosEvaluator`]
//! that reports network-level metrics, including [`jain_index`].
mod act;
mod base;
mod baseline;
mod config;
mod evaluator;
mod obs;
pub use act::WirelessAct;
pub use base::{WirelessEnv, WirelessInfo};
pub use baseline::{Scheduler, SchedulerMode};
pub use config::{StateTransition, WirelessEnvConfig};
pub use evaluator::{jain_index, QosEvaluator, QosMetrics};
pub use obs::WirelessObs;
