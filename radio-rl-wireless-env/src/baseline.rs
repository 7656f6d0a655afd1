//! Heuristic schedulers.
use crate::{WirelessAct, WirelessEnv, WirelessObs};
use anyhow::Result;
use radio_rl_core::{error::RadioRlError, Policy};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const DEFAULT_POWER: f32 = 0.4;

/// Allocation rule of a [`Scheduler`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum SchedulerMode {
    /// Equal resource-block shares `1 / n`, power 0.4.
    RoundRobin,

    /// Resource-block share 0.3 for every user, power 0.4.
    FixedRb,

    /// Equal resource-block shares `1 / n`, power 0.5.
    EqualPower,

    /// Resource blocks in proportion to channel quality and power
    /// `0.2 + 0.6 * csi / max(csi)`.
    ChannelAware,
}

impl SchedulerMode {
    /// All modes.
    pub const ALL: [SchedulerMode; 4] = [
        Self::RoundRobin,
        Self::FixedRb,
        Self::EqualPower,
        Self::ChannelAware,
    ];

    /// Name used on the command line and in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::FixedRb => "fixed_rb",
            Self::EqualPower => "equal_power",
            Self::ChannelAware => "channel_aware",
        }
    }
}

impl fmt::Display for SchedulerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchedulerMode {
    type Err = RadioRlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.name() == s)
            .copied()
            .ok_or_else(|| RadioRlError::InvalidConfig(format!("unknown scheduler mode: {}", s)))
    }
}

/// A fixed allocation rule used as a baseline against learned policies.
///
/// The number of active users comes from the observation, not from the
/// length of the state vector.
#[derive(Debug, Clone)]
pub struct Scheduler {
    max_users: usize,
    mode: SchedulerMode,
}

impl Scheduler {
    /// Constructs a scheduler for environments with `max_users` users at most.
    pub fn new(max_users: usize, mode: SchedulerMode) -> Self {
        Self { max_users, mode }
    }

    /// The allocation rule.
    pub fn mode(&self) -> SchedulerMode {
        self.mode
    }

    /// Returns the allocation for `obs`. Entries of inactive users are zero.
    pub fn allocate(&self, obs: &WirelessObs) -> Result<WirelessAct> {
        RadioRlError::check_dim("state", 4 * self.max_users, obs.state().len())?;
        let n = obs.current_users();
        let csi = obs.channel_quality();

        let rb: Vec<f32> = match self.mode {
            SchedulerMode::RoundRobin | SchedulerMode::EqualPower => vec![1.0 / n as f32; n],
            SchedulerMode::FixedRb => vec![0.3; n],
            SchedulerMode::ChannelAware => {
                let total: f32 = csi.iter().sum();
                if total > 0.0 {
                    csi.iter().map(|c| c / total).collect()
                } else {
                    vec![1.0 / n as f32; n]
                }
            }
        };
        let power: Vec<f32> = match self.mode {
            SchedulerMode::EqualPower => vec![0.5; n],
            SchedulerMode::ChannelAware => {
                let max = csi.iter().cloned().fold(0f32, f32::max);
                if max > 0.0 {
                    csi.iter().map(|c| 0.2 + 0.6 * c / max).collect()
                } else {
                    vec![0.2; n]
                }
            }
            _ => vec![DEFAULT_POWER; n],
        };

        let mut act = WirelessAct::zeros(self.max_users);
        act.0[..n].copy_from_slice(&rb);
        act.0[self.max_users..self.max_users + n].copy_from_slice(&power);
        Ok(act)
    }
}

impl Policy<WirelessEnv> for Scheduler {
    fn sample(&mut self, obs: &WirelessObs) -> Result<WirelessAct> {
        self.allocate(obs)
    }
}
