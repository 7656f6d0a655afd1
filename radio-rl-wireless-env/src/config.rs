//! Configuration of [`WirelessEnv`](crate::WirelessEnv).
use anyhow::Result;
use radio_rl_core::error::RadioRlError;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// How the next state is produced by a step.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum StateTransition {
    /// Distances and QoS classes are kept for the episode. Load and
    /// interference of the next state follow from the applied action and the
    /// channel quality is re-evaluated.
    CarryOver,

    /// Every step draws a fresh set of distances and QoS classes, as a reset
    /// does, without changing the number of users. Next states do not depend
    /// on actions.
    Resample,
}

impl Default for StateTransition {
    fn default() -> Self {
        Self::CarryOver
    }
}

/// Configuration of [`WirelessEnv`](crate::WirelessEnv).
///
/// Powers are in watts, distances in meters, bandwidth in hertz and delays
/// in milliseconds.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct WirelessEnvConfig {
    /// Maximum number of users; fixes the lengths of states and actions.
    pub max_users: usize,

    /// Minimum number of users.
    pub min_users: usize,

    /// Number of resets between draws of the number of users.
    pub user_resample_interval: usize,

    /// Transmit power of a user at power level 1.
    pub max_power: f64,

    /// Noise floor.
    pub noise_floor: f64,

    /// Interference per watt of mean transmit power.
    pub interference_factor: f64,

    /// Constant term of the path loss in dB.
    pub path_loss_a: f64,

    /// Distance coefficient of the path loss in dB per decade.
    pub path_loss_b: f64,

    /// Standard deviation of log-normal shadowing in dB, 0 to disable.
    pub shadowing_std: f64,

    /// Minimum distance of a user from the base station.
    pub min_distance: f64,

    /// Maximum distance of a user from the base station.
    pub max_distance: f64,

    /// Number of QoS classes.
    pub qos_levels: usize,

    /// Bandwidth of a resource block.
    pub bandwidth_per_rb: f64,

    /// Lower bound of the base delay.
    pub min_base_delay: f64,

    /// Upper bound of the base delay.
    pub max_base_delay: f64,

    /// Queueing delay per inverse Mbps.
    pub queue_delay_scale: f64,

    /// Packet loss with no resource block.
    pub max_packet_loss: f64,

    /// Decrease of packet loss per unit of resource-block share.
    pub packet_loss_slope: f64,

    /// Reward weight of the total throughput.
    pub throughput_weight: f64,

    /// Penalty weight of the total transmit power.
    pub power_penalty_weight: f64,

    /// Penalty weight of the total delay.
    pub delay_penalty_weight: f64,

    /// Penalty weight of the total packet loss.
    pub loss_penalty_weight: f64,

    /// How next states are produced.
    pub state_transition: StateTransition,

    /// Steps after which an episode is truncated.
    pub max_steps: Option<usize>,
}

impl Default for WirelessEnvConfig {
    fn default() -> Self {
        Self {
            max_users: 50,
            min_users: 10,
            user_resample_interval: 10,
            max_power: 20.0,
            noise_floor: 1e-9,
            interference_factor: 0.05,
            path_loss_a: 35.2,
            path_loss_b: 37.6,
            shadowing_std: 0.0,
            min_distance: 50.0,
            max_distance: 500.0,
            qos_levels: 5,
            bandwidth_per_rb: 180e3,
            min_base_delay: 1.0,
            max_base_delay: 5.0,
            queue_delay_scale: 10.0,
            max_packet_loss: 0.25,
            packet_loss_slope: 0.2,
            throughput_weight: 1.0,
            power_penalty_weight: 0.1,
            delay_penalty_weight: 0.05,
            loss_penalty_weight: 0.2,
            state_transition: StateTransition::CarryOver,
            max_steps: None,
        }
    }
}

impl WirelessEnvConfig {
    /// Sets the range of the number of users.
    pub fn users(mut self, min_users: usize, max_users: usize) -> Self {
        self.min_users = min_users;
        self.max_users = max_users;
        self
    }

    /// Sets the number of resets between draws of the number of users.
    pub fn user_resample_interval(mut self, v: usize) -> Self {
        self.user_resample_interval = v;
        self
    }

    /// Sets the transmit power at power level 1.
    pub fn max_power(mut self, v: f64) -> Self {
        self.max_power = v;
        self
    }

    /// Sets the noise floor.
    pub fn noise_floor(mut self, v: f64) -> Self {
        self.noise_floor = v;
        self
    }

    /// Sets the standard deviation of shadowing.
    pub fn shadowing_std(mut self, v: f64) -> Self {
        self.shadowing_std = v;
        self
    }

    /// Sets the range of user distances.
    pub fn distance(mut self, min_distance: f64, max_distance: f64) -> Self {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        self
    }

    /// Sets the state transition.
    pub fn state_transition(mut self, v: StateTransition) -> Self {
        self.state_transition = v;
        self
    }

    /// Sets the step budget of an episode.
    pub fn max_steps(mut self, v: Option<usize>) -> Self {
        self.max_steps = v;
        self
    }

    /// Length of the state vector.
    pub fn state_dim(&self) -> usize {
        4 * self.max_users
    }

    /// Length of the action vector.
    pub fn action_dim(&self) -> usize {
        2 * self.max_users
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), RadioRlError> {
        let invalid = |msg: String| Err(RadioRlError::InvalidConfig(msg));

        if self.max_users == 0 {
            return invalid("max_users must be positive".to_string());
        }
        if self.min_users == 0 {
            return invalid("min_users must be positive".to_string());
        }
        if self.min_users > self.max_users {
            return invalid(format!(
                "min_users {} exceeds max_users {}",
                self.min_users, self.max_users
            ));
        }
        if self.user_resample_interval == 0 {
            return invalid("user_resample_interval must be positive".to_string());
        }
        let params = [
            ("max_power", self.max_power),
            ("noise_floor", self.noise_floor),
            ("interference_factor", self.interference_factor),
            ("path_loss_a", self.path_loss_a),
            ("path_loss_b", self.path_loss_b),
            ("shadowing_std", self.shadowing_std),
            ("min_distance", self.min_distance),
            ("max_distance", self.max_distance),
            ("bandwidth_per_rb", self.bandwidth_per_rb),
            ("min_base_delay", self.min_base_delay),
            ("max_base_delay", self.max_base_delay),
            ("queue_delay_scale", self.queue_delay_scale),
            ("max_packet_loss", self.max_packet_loss),
            ("packet_loss_slope", self.packet_loss_slope),
            ("throughput_weight", self.throughput_weight),
            ("power_penalty_weight", self.power_penalty_weight),
            ("delay_penalty_weight", self.delay_penalty_weight),
            ("loss_penalty_weight", self.loss_penalty_weight),
        ];
        if let Some((name, v)) = params.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("{} must be finite, got {}", name, v));
        }
        if !(self.noise_floor > 0.0) {
            return invalid(format!("noise_floor must be positive, got {}", self.noise_floor));
        }
        if !(self.max_power >= 0.0) || !(self.interference_factor >= 0.0) {
            return invalid("max_power and interference_factor must be non-negative".to_string());
        }
        if !(self.min_distance > 0.0) || self.min_distance > self.max_distance {
            return invalid(format!(
                "invalid distance range [{}, {}]",
                self.min_distance, self.max_distance
            ));
        }
        if !(self.shadowing_std >= 0.0) {
            return invalid(format!(
                "shadowing_std must be non-negative, got {}",
                self.shadowing_std
            ));
        }
        if self.qos_levels == 0 {
            return invalid("qos_levels must be positive".to_string());
        }
        if self.min_base_delay > self.max_base_delay {
            return invalid(format!(
                "invalid base delay range [{}, {}]",
                self.min_base_delay, self.max_base_delay
            ));
        }
        Ok(())
    }

    /// Loads [`WirelessEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`WirelessEnvConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
