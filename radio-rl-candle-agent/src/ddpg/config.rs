//! Configuration of DDPG agent.
use super::{CriticConfig, DeterministicActorConfig};
use crate::{
    model::{SubModel1, SubModel2},
    util::{CriticLoss, InDim, OutDim},
    Device,
};
use anyhow::Result;
use candle_core::Tensor;
use log::info;
use radio_rl_core::{error::RadioRlError, replay_buffer::ReplayBufferConfig};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ddpg`](super::Ddpg).
#[allow(clippy::upper_case_acronyms)]
#[derive(Deserialize, Serialize)]
pub struct DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    /// Configuration of the actor model.
    pub actor_config: DeterministicActorConfig<P::Config>,

    /// Configuration of the critic model.
    pub critic_config: CriticConfig<Q::Config>,

    /// Discount factor.
    pub gamma: f64,

    /// Target smoothing coefficient in `[0, 1]`.
    ///
    /// Formula: target_params = tau * params + (1.0 - tau) * target_params
    pub tau: f64,

    /// Batch size for training.
    pub batch_size: usize,

    /// Standard deviation of the exploration noise in training mode.
    pub noise_scale: f32,

    /// Length of the state vector.
    pub state_dim: usize,

    /// Length of the action vector.
    pub action_dim: usize,

    /// Configuration of the replay buffer owned by the agent.
    pub replay_buffer_config: ReplayBufferConfig,

    /// Type of critic loss function.
    pub critic_loss: CriticLoss,

    /// Seed of the exploration noise.
    pub seed: u64,

    /// Device used for the actor and critic models.
    pub device: Device,
}

impl<Q, P> Clone for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    fn clone(&self) -> Self {
        Self {
            actor_config: self.actor_config.clone(),
            critic_config: self.critic_config.clone(),
            gamma: self.gamma,
            tau: self.tau,
            batch_size: self.batch_size,
            noise_scale: self.noise_scale,
            state_dim: self.state_dim,
            action_dim: self.action_dim,
            replay_buffer_config: self.replay_buffer_config.clone(),
            critic_loss: self.critic_loss,
            seed: self.seed,
            device: self.device,
        }
    }
}

impl<Q, P> Debug for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdpgConfig")
            .field("actor_config", &self.actor_config)
            .field("critic_config", &self.critic_config)
            .field("gamma", &self.gamma)
            .field("tau", &self.tau)
            .field("batch_size", &self.batch_size)
            .field("noise_scale", &self.noise_scale)
            .field("state_dim", &self.state_dim)
            .field("action_dim", &self.action_dim)
            .field("replay_buffer_config", &self.replay_buffer_config)
            .field("critic_loss", &self.critic_loss)
            .field("seed", &self.seed)
            .field("device", &self.device)
            .finish()
    }
}

impl<Q, P> PartialEq for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.actor_config == other.actor_config
            && self.critic_config == other.critic_config
            && self.gamma == other.gamma
            && self.tau == other.tau
            && self.batch_size == other.batch_size
            && self.noise_scale == other.noise_scale
            && self.state_dim == other.state_dim
            && self.action_dim == other.action_dim
            && self.replay_buffer_config == other.replay_buffer_config
            && self.critic_loss == other.critic_loss
            && self.seed == other.seed
            && self.device == other.device
    }
}

impl<Q, P> Default for DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            gamma: 0.99,
            tau: 0.005,
            batch_size: 128,
            noise_scale: 0.1,
            state_dim: 0,
            action_dim: 0,
            replay_buffer_config: ReplayBufferConfig::default(),
            critic_loss: CriticLoss::Mse,
            seed: 42,
            device: Device::Cpu,
        }
    }
}

impl<Q, P> DdpgConfig<Q, P>
where
    Q: SubModel2<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets soft update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Standard deviation of the exploration noise.
    pub fn noise_scale(mut self, v: f32) -> Self {
        self.noise_scale = v;
        self
    }

    /// Lengths of the state and action vectors.
    pub fn dims(mut self, state_dim: usize, action_dim: usize) -> Self {
        self.state_dim = state_dim;
        self.action_dim = action_dim;
        self
    }

    /// Critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Configuration of actor.
    pub fn actor_config(mut self, actor_config: DeterministicActorConfig<P::Config>) -> Self {
        self.actor_config = actor_config;
        self
    }

    /// Configuration of critic.
    pub fn critic_config(mut self, critic_config: CriticConfig<Q::Config>) -> Self {
        self.critic_config = critic_config;
        self
    }

    /// Configuration of the replay buffer.
    pub fn replay_buffer_config(mut self, v: ReplayBufferConfig) -> Self {
        self.replay_buffer_config = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Checks value ranges and the consistency of dimensions.
    pub fn validate(&self) -> Result<(), RadioRlError> {
        self.replay_buffer_config.validate()?;

        if self.batch_size == 0 {
            return Err(RadioRlError::InvalidConfig(
                "batch_size must be positive".to_string(),
            ));
        }
        if self.batch_size > self.replay_buffer_config.capacity {
            return Err(RadioRlError::InvalidConfig(format!(
                "batch_size {} exceeds replay buffer capacity {}",
                self.batch_size, self.replay_buffer_config.capacity
            )));
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return Err(RadioRlError::InvalidConfig(format!(
                "tau must be in [0, 1], got {}",
                self.tau
            )));
        }
        if self.state_dim == 0 || self.action_dim == 0 {
            return Err(RadioRlError::InvalidConfig(
                "state_dim and action_dim must be positive".to_string(),
            ));
        }
        let mismatch = |what: &str, expected: usize, actual: usize| {
            Err(RadioRlError::InvalidConfig(format!(
                "{} is {}, expected {}",
                what, actual, expected
            )))
        };
        if let Some(policy_config) = &self.actor_config.policy_config {
            if policy_config.get_in_dim() != self.state_dim {
                return mismatch("actor input", self.state_dim, policy_config.get_in_dim());
            }
            if policy_config.get_out_dim() != self.action_dim {
                return mismatch("actor output", self.action_dim, policy_config.get_out_dim());
            }
        }
        if let Some(q_config) = &self.critic_config.q_config {
            let in_dim = self.state_dim + self.action_dim;
            if q_config.get_in_dim() != in_dim {
                return mismatch("critic input", in_dim, q_config.get_in_dim());
            }
            if q_config.get_out_dim() != 1 {
                return mismatch("critic output", 1, q_config.get_out_dim());
            }
        }
        Ok(())
    }

    /// Constructs [`DdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DDPG agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DdpgConfig`] to YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DDPG agent into {:?}", path_);
        Ok(())
    }
}
