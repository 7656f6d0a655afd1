use super::{Critic, DdpgConfig, DeterministicActor, GaussianNoise};
use crate::{
    model::{SubModel1, SubModel2},
    util::{
        batch_to_tensor, no_grad, reward, slice_to_tensor, smooth_l1_loss, CriticLoss, InDim,
        OutDim,
    },
};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::loss::mse;
use log::{debug, info};
use radio_rl_core::{
    error::RadioRlError,
    record::{Record, RecordValue},
    replay_buffer::{ArrayBatch, GenericTransitionBatch, ReplayBuffer},
    Agent, Configurable, Env, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt::Debug,
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
};

type Transition = GenericTransitionBatch<ArrayBatch, ArrayBatch>;

/// Deep deterministic policy gradient (DDPG) agent.
///
/// States and actions are flat `f32` vectors of lengths `state_dim` and
/// `action_dim`. Actions are bounded to `[0, 1]`.
pub struct Ddpg<E, Q, P>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    actor: DeterministicActor<P>,
    critic: Critic<Q>,
    buffer: ReplayBuffer<ArrayBatch, ArrayBatch>,
    explorer: GaussianNoise,
    rng: StdRng,
    gamma: f64,
    tau: f64,
    batch_size: usize,
    noise_scale: f32,
    state_dim: usize,
    action_dim: usize,
    critic_loss: CriticLoss,
    train: bool,
    n_opts: usize,
    device: Device,
    phantom: PhantomData<E>,
}

impl<E, Q, P> Ddpg<E, Q, P>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    /// Returns the action of the live actor for `state`.
    ///
    /// `N(0, noise_scale^2)` noise is added to each entry before clipping to
    /// `[0, 1]`. With `noise_scale == 0` the action is deterministic.
    pub fn select_action(&mut self, state: &[f32], noise_scale: f32) -> Result<Vec<f32>> {
        RadioRlError::check_dim("state", self.state_dim, state.len())?;
        let obs = slice_to_tensor(state, &self.device)?;
        let act = no_grad(|| self.actor.forward(&obs))?;
        let mut act = act.squeeze(0)?.to_vec1::<f32>()?;
        self.explorer.action(&mut act, noise_scale, &mut self.rng)?;
        Ok(act)
    }

    /// Stores the transition `(state, action, reward, next_state)`.
    pub fn save_experience(
        &mut self,
        state: &[f32],
        action: &[f32],
        reward: f32,
        next_state: &[f32],
    ) -> Result<()> {
        self.push_transition(GenericTransitionBatch {
            obs: ArrayBatch::from_row(state.to_vec()),
            act: ArrayBatch::from_row(action.to_vec()),
            next_obs: ArrayBatch::from_row(next_state.to_vec()),
            reward: vec![reward],
            ix_sample: None,
        })
    }

    fn push_transition(&mut self, tr: Transition) -> Result<()> {
        RadioRlError::check_dim("state", self.state_dim, tr.obs.dim())?;
        RadioRlError::check_dim("action", self.action_dim, tr.act.dim())?;
        RadioRlError::check_dim("next state", self.state_dim, tr.next_obs.dim())?;
        self.buffer.push(tr)
    }

    /// Regresses the critic on the one-step target and steps its optimizer.
    ///
    /// Returns the critic loss and the target Q-values.
    fn update_critic(
        &mut self,
        obs: &Tensor,
        act: &Tensor,
        next_obs: &Tensor,
        r: &Tensor,
    ) -> Result<(Tensor, Tensor)> {
        let q_tgt = no_grad(|| {
            let next_act = self.actor.forward_tgt(next_obs)?;
            let next_q = self.critic.qvals_tgt(next_obs, &next_act)?;
            Ok((r + (next_q * self.gamma)?)?)
        })?;
        debug_assert_eq!(q_tgt.dims(), r.dims());

        let q = self.critic.qvals(obs, act)?;
        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&q, &q_tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&q, &q_tgt)?,
        };
        self.critic.backward_step(&loss)?;
        Ok((loss, q_tgt))
    }

    /// Ascends the critic's value of the actor's action.
    ///
    /// Gradients reach the critic variables too, but only the actor
    /// optimizer steps.
    fn update_actor(&mut self, obs: &Tensor) -> Result<Tensor> {
        let act = self.actor.forward(obs)?;
        let loss = self.critic.qvals(obs, &act)?.mean_all()?.neg()?;
        self.actor.backward_step(&loss)?;
        Ok(loss)
    }

    /// Performs one DDPG update.
    ///
    /// Returns `Ok(None)` while the replay buffer holds fewer than
    /// `batch_size` transitions.
    pub fn update(&mut self) -> Result<Option<Record>> {
        if self.buffer.len() < self.batch_size {
            return Ok(None);
        }

        let batch = self.buffer.batch(self.batch_size)?;
        let (obs, act, next_obs, r) = batch.unpack();
        let obs = batch_to_tensor(obs, &self.device)?;
        let act = batch_to_tensor(act, &self.device)?;
        let next_obs = batch_to_tensor(next_obs, &self.device)?;
        let r = reward(r, &self.device)?;

        let (loss_critic, q_tgt) = self.update_critic(&obs, &act, &next_obs, &r)?;
        let loss_actor = self.update_actor(&obs)?;

        self.actor.soft_update(self.tau)?;
        self.critic.soft_update(self.tau)?;
        self.n_opts += 1;

        let loss_critic = loss_critic.to_scalar::<f32>()?;
        let loss_actor = loss_actor.to_scalar::<f32>()?;
        let q_tgt_abs_mean = q_tgt.abs()?.mean_all()?.to_scalar::<f32>()?;
        debug!(
            "opt {}: loss_critic {:.4}, loss_actor {:.4}",
            self.n_opts, loss_critic, loss_actor
        );

        Ok(Some(Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("loss_actor", RecordValue::Scalar(loss_actor)),
            ("q_tgt_abs_mean", RecordValue::Scalar(q_tgt_abs_mean)),
        ])))
    }

    /// Number of performed updates.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    #[cfg(test)]
    pub(crate) fn actor(&self) -> &DeterministicActor<P> {
        &self.actor
    }

    #[cfg(test)]
    pub(crate) fn critic(&self) -> &Critic<Q> {
        &self.critic
    }
}

impl<E, Q, P> Policy<E> for Ddpg<E, Q, P>
where
    E: Env,
    E::Obs: AsRef<[f32]>,
    E::Act: From<Vec<f32>>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    /// Noisy action in training mode, greedy action in evaluation mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let noise_scale = if self.train { self.noise_scale } else { 0.0 };
        Ok(self.select_action(obs.as_ref(), noise_scale)?.into())
    }
}

impl<E, Q, P> Configurable for Ddpg<E, Q, P>
where
    E: Env,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    type Config = DdpgConfig<Q, P>;

    /// Constructs [`Ddpg`] agent.
    fn build(config: Self::Config) -> Result<Self> {
        config.validate()?;
        let device = config.device.to_candle()?;
        let actor = DeterministicActor::build(config.actor_config, &device)?;
        let critic = Critic::build(config.critic_config, &device)?;
        let buffer = ReplayBuffer::build(&config.replay_buffer_config)?;
        info!(
            "Built DDPG agent, state_dim {}, action_dim {}",
            config.state_dim, config.action_dim
        );

        Ok(Ddpg {
            actor,
            critic,
            buffer,
            explorer: GaussianNoise::new(0.0, 1.0),
            rng: StdRng::seed_from_u64(config.seed),
            gamma: config.gamma,
            tau: config.tau,
            batch_size: config.batch_size,
            noise_scale: config.noise_scale,
            state_dim: config.state_dim,
            action_dim: config.action_dim,
            critic_loss: config.critic_loss,
            train: false,
            n_opts: 0,
            device,
            phantom: PhantomData,
        })
    }
}

impl<E, Q, P> Agent<E> for Ddpg<E, Q, P>
where
    E: Env,
    E::Obs: AsRef<[f32]>,
    E::Act: From<Vec<f32>>,
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + InDim + OutDim + Debug + PartialEq + Clone,
{
    type Buffer = ReplayBuffer<ArrayBatch, ArrayBatch>;

    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn buffer(&self) -> &Self::Buffer {
        &self.buffer
    }

    fn save_experience(&mut self, tr: Transition) -> Result<()> {
        self.push_transition(tr)
    }

    fn opt_with_record(&mut self) -> Result<Option<Record>> {
        self.update()
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(path)?;
        let mut paths = self.actor.save(path)?;
        paths.extend(self.critic.save(path)?);
        Ok(paths)
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.actor.load(path)?;
        self.critic.load(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ddpg::{CriticConfig, DeterministicActorConfig},
        mlp::{Mlp, MlpConfig},
        util::flat_params,
        Activation,
    };
    use radio_rl_core::{record::Record, replay_buffer::ReplayBufferConfig, Act, Info, Obs, Step};
    use tempdir::TempDir;

    const STATE_DIM: usize = 4;
    const ACTION_DIM: usize = 2;

    #[derive(Clone, Debug)]
    struct VecObs(Vec<f32>);

    impl Obs for VecObs {
        fn len(&self) -> usize {
            self.0.len()
        }
    }

    impl AsRef<[f32]> for VecObs {
        fn as_ref(&self) -> &[f32] {
            &self.0
        }
    }

    #[derive(Clone, Debug)]
    struct VecAct(Vec<f32>);

    impl Act for VecAct {
        fn len(&self) -> usize {
            self.0.len()
        }
    }

    impl From<Vec<f32>> for VecAct {
        fn from(v: Vec<f32>) -> Self {
            Self(v)
        }
    }

    struct NoInfo;

    impl Info for NoInfo {}

    /// Rewards actions close to the first half of the state.
    struct TrackingEnv {
        state: Vec<f32>,
    }

    impl Env for TrackingEnv {
        type Config = ();
        type Obs = VecObs;
        type Act = VecAct;
        type Info = NoInfo;

        fn build(_config: &Self::Config, _seed: i64) -> Result<Self> {
            Ok(Self {
                state: vec![0.5; STATE_DIM],
            })
        }

        fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
            let reward = -a
                .0
                .iter()
                .zip(self.state.iter())
                .map(|(a, s)| (a - s).powi(2))
                .sum::<f32>();
            let step = Step::new(VecObs(self.state.clone()), a.clone(), reward, false, false, NoInfo);
            Ok((step, Record::empty()))
        }

        fn reset(&mut self) -> Result<Self::Obs> {
            Ok(VecObs(self.state.clone()))
        }

        fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
            self.reset()
        }
    }

    type TestDdpg = Ddpg<TrackingEnv, Mlp, Mlp>;

    fn config(batch_size: usize, tau: f64) -> DdpgConfig<Mlp, Mlp> {
        let actor_config = DeterministicActorConfig::default().policy_config(
            MlpConfig::new(STATE_DIM, vec![16, 8], ACTION_DIM).out_activation(Activation::Sigmoid),
        );
        let critic_config = CriticConfig::default().q_config(
            MlpConfig::new(STATE_DIM + ACTION_DIM, vec![16, 8], 1)
                .hidden_activation(Activation::LeakyReLU(0.01)),
        );
        DdpgConfig::default()
            .dims(STATE_DIM, ACTION_DIM)
            .batch_size(batch_size)
            .tau(tau)
            .actor_config(actor_config)
            .critic_config(critic_config)
            .replay_buffer_config(ReplayBufferConfig::default().capacity(100))
    }

    fn fill(agent: &mut TestDdpg, n: usize) -> Result<()> {
        for i in 0..n {
            let s = vec![i as f32 / n as f32; STATE_DIM];
            agent.save_experience(&s, &[0.2, 0.8], -(i as f32), &s)?;
        }
        Ok(())
    }

    fn all_params(agent: &TestDdpg) -> Result<Vec<Vec<(String, Vec<f32>)>>> {
        let (a, a_tgt) = agent.actor().varmaps();
        let (c, c_tgt) = agent.critic().varmaps();
        Ok(vec![
            flat_params(a)?,
            flat_params(a_tgt)?,
            flat_params(c)?,
            flat_params(c_tgt)?,
        ])
    }

    #[test]
    fn test_select_action() -> Result<()> {
        let mut agent = TestDdpg::build(config(4, 0.005))?;
        let state = [0.1, 0.2, 0.3, 0.4];

        let a1 = agent.select_action(&state, 0.0)?;
        let a2 = agent.select_action(&state, 0.0)?;
        assert_eq!(a1.len(), ACTION_DIM);
        assert_eq!(a1, a2);

        for _ in 0..50 {
            let a = agent.select_action(&state, 0.5)?;
            assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch() -> Result<()> {
        let mut agent = TestDdpg::build(config(4, 0.005))?;

        let err = agent.select_action(&[0.0; 3], 0.0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RadioRlError>(),
            Some(&RadioRlError::DimensionMismatch {
                what: "state".to_string(),
                expected: STATE_DIM,
                actual: 3
            })
        );

        let err = agent
            .save_experience(&[0.0; STATE_DIM], &[0.0; 3], 0.0, &[0.0; STATE_DIM])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RadioRlError>(),
            Some(RadioRlError::DimensionMismatch { .. })
        ));
        assert_eq!(agent.buffer().len(), 0);
        Ok(())
    }

    #[test]
    fn test_update_waits_for_one_batch() -> Result<()> {
        let mut agent = TestDdpg::build(config(4, 0.5))?;
        fill(&mut agent, 3)?;
        let before = all_params(&agent)?;
        assert!(agent.update()?.is_none());
        assert_eq!(all_params(&agent)?, before);
        assert_eq!(agent.n_opts(), 0);

        fill(&mut agent, 1)?;
        let record = agent.update()?.expect("update with one batch");
        for key in ["loss_critic", "loss_actor", "q_tgt_abs_mean"].iter() {
            assert!(record.get_scalar(key)?.is_finite());
        }
        assert_eq!(agent.n_opts(), 1);
        assert_ne!(all_params(&agent)?, before);
        Ok(())
    }

    #[test]
    fn test_actor_step_keeps_critic() -> Result<()> {
        let mut agent = TestDdpg::build(config(4, 0.005))?;
        let obs = (0..4 * STATE_DIM).map(|i| i as f32 / 16.0).collect();
        let obs = batch_to_tensor(ArrayBatch::from_vec(obs, STATE_DIM), &agent.device)?;

        let before = all_params(&agent)?;
        agent.update_actor(&obs)?;
        let after = all_params(&agent)?;

        assert_ne!(before[0], after[0]);
        assert_eq!(before[1], after[1]);
        assert_eq!(before[2], after[2]);
        assert_eq!(before[3], after[3]);
        Ok(())
    }

    #[test]
    fn test_soft_update_extremes() -> Result<()> {
        // tau = 1 copies the live networks into the targets
        let mut agent = TestDdpg::build(config(4, 1.0))?;
        fill(&mut agent, 8)?;
        agent.update()?;
        let params = all_params(&agent)?;
        assert_eq!(params[0], params[1]);
        assert_eq!(params[2], params[3]);

        // tau = 0 leaves the targets untouched
        let mut agent = TestDdpg::build(config(4, 0.0))?;
        fill(&mut agent, 8)?;
        let before = all_params(&agent)?;
        agent.update()?;
        let after = all_params(&agent)?;
        assert_eq!(before[1], after[1]);
        assert_eq!(before[3], after[3]);
        assert_ne!(before[2], after[2]);
        Ok(())
    }

    #[test]
    fn test_save_and_load_params() -> Result<()> {
        let mut agent = TestDdpg::build(config(4, 0.1))?;
        fill(&mut agent, 8)?;
        agent.update()?;

        let dir = TempDir::new("ddpg")?;
        let paths = Agent::<TrackingEnv>::save_params(&agent, dir.path())?;
        assert_eq!(paths.len(), 4);
        assert!(dir.path().join("critic_tgt.safetensors").exists());

        let mut agent_ = TestDdpg::build(config(4, 0.1))?;
        Agent::<TrackingEnv>::load_params(&mut agent_, dir.path())?;
        assert_eq!(all_params(&agent)?, all_params(&agent_)?);
        Ok(())
    }

    #[test]
    fn test_policy_mode() -> Result<()> {
        let mut agent = TestDdpg::build(config(4, 0.005))?;
        let obs = VecObs(vec![0.3; STATE_DIM]);

        Agent::<TrackingEnv>::eval(&mut agent);
        let a1 = Policy::<TrackingEnv>::sample(&mut agent, &obs)?;
        let a2 = Policy::<TrackingEnv>::sample(&mut agent, &obs)?;
        assert_eq!(a1.0, a2.0);

        Agent::<TrackingEnv>::train(&mut agent);
        assert!(Agent::<TrackingEnv>::is_train(&agent));
        let a3 = Policy::<TrackingEnv>::sample(&mut agent, &obs)?;
        assert_eq!(a3.len(), ACTION_DIM);
        assert_ne!(a1.0, a3.0);
        Ok(())
    }
}
