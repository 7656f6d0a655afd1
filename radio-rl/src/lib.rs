//! Reinforcement learning for wireless radio resource allocation.
//!
//! The workspace consists of the following crates:
//!
//! * [`radio_rl_core`] provides the traits shared by environments and agents,
//!   the replay buffer, the [`Trainer`](radio_rl_core::Trainer) and records.
//! * [`radio_rl_candle_agent`] implements the DDPG agent on
//!   [candle](https://crates.io/crates/candle-core).
//! * [`radio_rl_wireless_env`] simulates a single cell with a variable number
//!   of users, and provides heuristic schedulers and a QoS evaluator.
//! * This crate ties them together and hosts the example drivers:
//!   * `ddpg_wireless` trains the agent and evaluates the best model;
//!   * `compare_baselines` evaluates a trained agent against a heuristic
//!     scheduler on the same episodes and writes a CSV report.
pub mod util;
