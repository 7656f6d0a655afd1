//! Helpers shared by the example drivers.
use radio_rl_candle_agent::{
    ddpg::{CriticConfig, Ddpg, DdpgConfig, DeterministicActorConfig},
    mlp::{Mlp, MlpConfig},
    opt::OptimizerConfig,
    Activation,
};
use radio_rl_core::replay_buffer::{ArrayBatch, ReplayBufferConfig, SimpleStepProcessor};
use radio_rl_wireless_env::{WirelessEnv, WirelessEnvConfig};

/// DDPG agent on [`WirelessEnv`] with MLP actor and critic.
pub type WirelessDdpg = Ddpg<WirelessEnv, Mlp, Mlp>;

/// Step processor feeding [`WirelessDdpg`].
pub type WirelessStepProcessor = SimpleStepProcessor<WirelessEnv, ArrayBatch, ArrayBatch>;

/// Widths of the hidden layers of the actor and the critic.
pub const HIDDEN_UNITS: [usize; 3] = [256, 128, 64];

/// Learning rate of the actor.
pub const LR_ACTOR: f64 = 1e-4;

/// Learning rate of the critic.
pub const LR_CRITIC: f64 = 1e-3;

/// Metrics for which a smaller value is better.
pub const LOWER_IS_BETTER: [&str; 2] = ["delay", "packet_loss"];

/// Builds the agent configuration matching the dimensions of `env_config`.
///
/// The actor ends with a sigmoid so that actions lie in `[0, 1]`; the critic
/// uses leaky ReLU hidden layers on the concatenated state and action.
pub fn ddpg_config(
    env_config: &WirelessEnvConfig,
    units: &[usize],
    replay_buffer_capacity: usize,
) -> DdpgConfig<Mlp, Mlp> {
    let state_dim = env_config.state_dim();
    let action_dim = env_config.action_dim();

    let actor_config = DeterministicActorConfig::default()
        .opt_config(OptimizerConfig::Adam { lr: LR_ACTOR })
        .policy_config(
            MlpConfig::new(state_dim, units.to_vec(), action_dim)
                .out_activation(Activation::Sigmoid),
        );
    let critic_config = CriticConfig::default()
        .opt_config(OptimizerConfig::Adam { lr: LR_CRITIC })
        .q_config(
            MlpConfig::new(state_dim + action_dim, units.to_vec(), 1)
                .hidden_activation(Activation::LeakyReLU(0.01)),
        );

    DdpgConfig::default()
        .dims(state_dim, action_dim)
        .actor_config(actor_config)
        .critic_config(critic_config)
        .replay_buffer_config(ReplayBufferConfig::default().capacity(replay_buffer_capacity))
}

/// Relative improvement of `ours` over `baseline` for the named metric.
///
/// Positive values mean `ours` is better, also for metrics in
/// [`LOWER_IS_BETTER`]. Returns `None` when the baseline is zero.
pub fn improvement(metric: &str, ours: f32, baseline: f32) -> Option<f32> {
    if baseline == 0.0 {
        return None;
    }
    let diff = if LOWER_IS_BETTER.contains(&metric) {
        baseline - ours
    } else {
        ours - baseline
    };
    Some(diff / baseline.abs())
}
