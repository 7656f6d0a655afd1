//! Wireless environment.
use crate::{StateTransition, WirelessAct, WirelessEnvConfig, WirelessObs};
use anyhow::Result;
use log::{debug, info, trace};
use radio_rl_core::{
    error::RadioRlError,
    record::{Record, RecordValue::Scalar},
    Act, Env, Info, Step,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const EPS: f64 = 1e-6;

/// Per-user outcome of a step, each of length `current_users`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WirelessInfo {
    /// Throughput in Mbps.
    pub throughput: Vec<f32>,

    /// End-to-end delay in ms.
    pub delay: Vec<f32>,

    /// Packet loss rate in `[0, 1]`.
    pub packet_loss: Vec<f32>,

    /// Transmit power in watts.
    pub power: Vec<f32>,

    /// Throughput per watt.
    pub energy_efficiency: Vec<f32>,
}

impl Info for WirelessInfo {}

/// Single-cell downlink with a variable number of users.
///
/// The number of users is drawn from `[min_users, max_users]` on every
/// `user_resample_interval`-th reset, starting with the first one, and never
/// changes within an episode.
pub struct WirelessEnv {
    config: WirelessEnvConfig,
    seed: u64,
    rng: StdRng,
    shadowing: Option<Normal<f64>>,

    /// Channel gain at `min_distance` without shadowing.
    gain_ref: f64,

    current_users: usize,
    n_resets: usize,
    t: usize,
    distance: Vec<f64>,
    qos_class: Vec<usize>,

    /// Per-user delay without queueing, held for the episode.
    base_delay: Vec<f64>,

    gain: Vec<f64>,
    load: f64,
    interference: f64,
}

fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len().max(1) as f64
}

impl WirelessEnv {
    /// Number of active users.
    pub fn current_users(&self) -> usize {
        self.current_users
    }

    /// Configuration of the environment.
    pub fn config(&self) -> &WirelessEnvConfig {
        &self.config
    }

    fn path_gain(&self, distance: f64, shadow: f64) -> f64 {
        let path_loss = self.config.path_loss_a + self.config.path_loss_b * distance.log10() + shadow;
        10f64.powf(-path_loss / 20.0)
    }

    fn draw_users(&mut self) {
        let n = self
            .rng
            .gen_range(self.config.min_users..=self.config.max_users);
        if n != self.current_users {
            info!("Number of users changes from {} to {}", self.current_users, n);
        }
        self.current_users = n;
    }

    fn draw_user_states(&mut self) {
        let n = self.current_users;
        let (d_min, d_max) = (self.config.min_distance, self.config.max_distance);
        let (b_min, b_max) = (self.config.min_base_delay, self.config.max_base_delay);
        let qos_levels = self.config.qos_levels;
        let rng = &mut self.rng;
        self.distance = (0..n).map(|_| rng.gen_range(d_min..=d_max)).collect();
        self.qos_class = (0..n).map(|_| rng.gen_range(1..=qos_levels)).collect();
        self.base_delay = (0..n).map(|_| rng.gen_range(b_min..=b_max)).collect();
    }

    fn update_gain(&mut self) {
        let rng = &mut self.rng;
        let shadows: Vec<f64> = match &self.shadowing {
            Some(normal) => (0..self.current_users)
                .map(|_| normal.sample(&mut *rng))
                .collect(),
            None => vec![0.0; self.current_users],
        };
        self.gain = self
            .distance
            .iter()
            .zip(shadows.iter())
            .map(|(d, s)| self.path_gain(*d, *s))
            .collect();
    }

    fn observe(&self) -> WirelessObs {
        let n = self.current_users;
        let mut state = vec![0f32; self.config.state_dim()];
        let qos_levels = self.config.qos_levels as f64;

        for i in 0..n {
            state[i] = (self.gain[i] / self.gain_ref).clamp(0.0, 1.0) as f32;
            state[n + i] = (self.qos_class[i] as f64 / qos_levels).clamp(0.0, 1.0) as f32;
            state[2 * n + i] = self.load.clamp(0.0, 1.0) as f32;
            state[3 * n + i] = self.interference.clamp(0.0, 1.0) as f32;
        }

        WirelessObs::new(state, n)
    }

    fn reset_(&mut self, draw_users: bool) -> WirelessObs {
        if draw_users {
            self.draw_users();
        }
        self.draw_user_states();
        self.update_gain();
        self.load = 0.0;
        self.interference = 0.0;
        self.t = 0;
        self.observe()
    }
}

impl Env for WirelessEnv {
    type Config = WirelessEnvConfig;
    type Obs = WirelessObs;
    type Act = WirelessAct;
    type Info = WirelessInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        config.validate()?;
        let shadowing = if config.shadowing_std > 0.0 {
            Some(Normal::new(0.0, config.shadowing_std)?)
        } else {
            None
        };
        let seed = seed as u64;

        let mut env = Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            shadowing,
            gain_ref: 1.0,
            current_users: config.max_users,
            n_resets: 0,
            t: 0,
            distance: vec![],
            qos_class: vec![],
            base_delay: vec![],
            gain: vec![],
            load: 0.0,
            interference: 0.0,
        };
        env.gain_ref = env.path_gain(config.min_distance, 0.0);
        env.reset_(false);
        info!(
            "Built wireless environment, {}..={} users, seed {}",
            config.min_users, config.max_users, seed
        );

        Ok(env)
    }

    fn reset(&mut self) -> Result<WirelessObs> {
        let draw_users = self.n_resets % self.config.user_resample_interval == 0;
        self.n_resets += 1;
        Ok(self.reset_(draw_users))
    }

    /// Restarts the random number generator from `seed + ix` and draws a new
    /// number of users, so that episode `ix` is the same on every call.
    fn reset_with_index(&mut self, ix: usize) -> Result<WirelessObs> {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        Ok(self.reset_(true))
    }

    fn step(&mut self, a: &WirelessAct) -> Result<(Step<Self>, Record)> {
        trace!("WirelessEnv::step()");
        RadioRlError::check_dim("action", self.config.action_dim(), a.len())?;

        let n = self.current_users;
        let c = &self.config;
        let rb: Vec<f64> = a.rb(n).iter().map(|v| (*v as f64).clamp(0.0, 1.0)).collect();
        let level: Vec<f64> = a.power(n).iter().map(|v| (*v as f64).clamp(0.0, 1.0)).collect();
        let power: Vec<f64> = level.iter().map(|l| l * c.max_power).collect();
        let interference = c.noise_floor + c.interference_factor * mean(&power);

        let mut info = WirelessInfo::default();
        let (mut tp_total, mut p_total, mut delay_total, mut loss_total) = (0.0, 0.0, 0.0, 0.0);

        for i in 0..n {
            let sinr = power[i] * self.gain[i] / interference;
            let tp = c.bandwidth_per_rb * (1.0 + sinr.max(0.0)).log2() / 1e6;
            let tp = RadioRlError::check_finite("throughput", tp)?;
            let delay = self.base_delay[i] + c.queue_delay_scale / (tp + EPS);
            let delay = RadioRlError::check_finite("delay", delay)?;
            let loss = (c.max_packet_loss - c.packet_loss_slope * rb[i]).clamp(0.0, 1.0);
            let loss = RadioRlError::check_finite("packet loss", loss)?;
            let ee = tp / (power[i] + EPS);

            tp_total += tp;
            p_total += power[i];
            delay_total += delay;
            loss_total += loss;

            info.throughput.push(tp as f32);
            info.delay.push(delay as f32);
            info.packet_loss.push(loss as f32);
            info.power.push(power[i] as f32);
            info.energy_efficiency.push(ee as f32);
        }

        let reward = c.throughput_weight * tp_total
            - c.power_penalty_weight * p_total
            - (c.delay_penalty_weight * delay_total + c.loss_penalty_weight * loss_total);
        let reward = RadioRlError::check_finite("reward", reward)?;

        match c.state_transition {
            StateTransition::CarryOver => {
                self.load = mean(&rb);
                self.interference = mean(&level);
            }
            StateTransition::Resample => {
                self.draw_user_states();
                self.load = 0.0;
                self.interference = 0.0;
            }
        }
        self.update_gain();
        self.t += 1;

        let is_truncated = self.config.max_steps.map_or(false, |m| self.t >= m);
        debug!(
            "t {}, users {}, throughput {:.3}, power {:.3}, reward {:.3}",
            self.t, n, tp_total, p_total, reward
        );

        let record = Record::from_slice(&[
            ("reward", Scalar(reward as f32)),
            ("throughput_total", Scalar(tp_total as f32)),
            ("power_total", Scalar(p_total as f32)),
            ("current_users", Scalar(n as f32)),
        ]);
        let step = Step::new(
            self.observe(),
            a.clone(),
            reward as f32,
            false,
            is_truncated,
            info,
        );

        Ok((step, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radio_rl_core::Obs;

    fn random_action(rng: &mut StdRng, max_users: usize) -> WirelessAct {
        WirelessAct((0..2 * max_users).map(|_| rng.gen::<f32>()).collect())
    }

    #[test]
    fn test_reset_pads_state() -> Result<()> {
        let config = WirelessEnvConfig::default()
            .users(3, 12)
            .user_resample_interval(1);
        let mut env = WirelessEnv::build(&config, 0)?;

        for _ in 0..20 {
            let obs = env.reset()?;
            let n = env.current_users();
            assert_eq!(obs.len(), 4 * 12);
            assert_eq!(obs.current_users(), n);
            assert!((3..=12).contains(&n));
            assert!(obs.state()[4 * n..].iter().all(|v| *v == 0.0));
            assert!(obs.state().iter().all(|v| (0.0..=1.0).contains(v)));
            assert!(obs.channel_quality().iter().all(|v| *v > 0.0));
            assert!(obs.load().iter().all(|v| *v == 0.0));
            assert!(obs.interference().iter().all(|v| *v == 0.0));
        }
        Ok(())
    }

    #[test]
    fn test_full_user_set_fills_state() -> Result<()> {
        let config = WirelessEnvConfig::default().users(6, 6);
        let mut env = WirelessEnv::build(&config, 1)?;
        let obs = env.reset()?;
        assert_eq!(obs.current_users(), 6);
        assert_eq!(obs.qos_demand().len(), 6);
        for q in obs.qos_demand() {
            let class = q * 5.0;
            assert!((class - class.round()).abs() < 1e-5);
            assert!((1.0..=5.0).contains(&class.round()));
        }
        Ok(())
    }

    #[test]
    fn test_step_outputs() -> Result<()> {
        let config = WirelessEnvConfig::default().users(1, 20).shadowing_std(8.0);
        let mut env = WirelessEnv::build(&config, 2)?;
        let mut rng = StdRng::seed_from_u64(0);

        for _ in 0..5 {
            env.reset()?;
            let n = env.current_users();
            for _ in 0..10 {
                let (step, record) = env.step(&random_action(&mut rng, 20))?;
                assert!(step.reward.is_finite());
                assert!(!step.is_done());
                assert_eq!(step.info.throughput.len(), n);
                assert_eq!(step.info.delay.len(), n);
                assert_eq!(step.info.packet_loss.len(), n);
                assert_eq!(step.info.power.len(), n);
                assert_eq!(step.info.energy_efficiency.len(), n);
                assert_eq!(record.get_scalar("current_users")?, n as f32);
                assert_eq!(record.get_scalar("reward")?, step.reward);
                assert_eq!(step.obs.current_users(), n);
            }
        }
        Ok(())
    }

    #[test]
    fn test_zero_action() -> Result<()> {
        let config = WirelessEnvConfig::default().users(10, 10);
        let mut env = WirelessEnv::build(&config, 3)?;
        env.reset()?;
        let (step, _) = env.step(&WirelessAct::zeros(10))?;

        assert_eq!(step.info.throughput, vec![0.0; 10]);
        for loss in step.info.packet_loss.iter() {
            assert!((loss - 0.25).abs() < 1e-6);
        }
        assert!(step.reward.is_finite());
        Ok(())
    }

    #[test]
    fn test_reward_composition() -> Result<()> {
        let config = WirelessEnvConfig::default().users(4, 4);
        let mut env = WirelessEnv::build(&config, 4)?;
        env.reset()?;
        let (step, _) = env.step(&WirelessAct(vec![0.5; 8]))?;

        let info = &step.info;
        let sum = |v: &Vec<f32>| v.iter().map(|x| *x as f64).sum::<f64>();
        let expected = sum(&info.throughput)
            - 0.1 * sum(&info.power)
            - (0.05 * sum(&info.delay) + 0.2 * sum(&info.packet_loss));
        assert!((step.reward as f64 - expected).abs() < 1e-3 * expected.abs().max(1.0));
        assert!(info.power.iter().all(|p| (p - 10.0).abs() < 1e-5));
        assert!(info.packet_loss.iter().all(|l| (l - 0.15).abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn test_zero_max_power() -> Result<()> {
        let config = WirelessEnvConfig::default().users(5, 5).max_power(0.0);
        let mut env = WirelessEnv::build(&config, 5)?;
        env.reset()?;
        let (step, _) = env.step(&WirelessAct(vec![1.0; 10]))?;
        assert_eq!(step.info.throughput, vec![0.0; 5]);
        assert_eq!(step.info.energy_efficiency, vec![0.0; 5]);
        assert!(step.reward.is_finite());
        Ok(())
    }

    #[test]
    fn test_action_dimension_mismatch() -> Result<()> {
        let mut env = WirelessEnv::build(&WirelessEnvConfig::default().users(2, 8), 0)?;
        env.reset()?;
        let err = env.step(&WirelessAct(vec![0.5; 15])).err().unwrap();
        assert_eq!(
            err.downcast_ref::<RadioRlError>(),
            Some(&RadioRlError::DimensionMismatch {
                what: "action".to_string(),
                expected: 16,
                actual: 15
            })
        );
        Ok(())
    }

    #[test]
    fn test_non_finite_action() -> Result<()> {
        let mut env = WirelessEnv::build(&WirelessEnvConfig::default().users(2, 2), 0)?;
        env.reset()?;
        let err = env
            .step(&WirelessAct(vec![0.5, 0.5, f32::NAN, 0.5]))
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<RadioRlError>(),
            Some(RadioRlError::NumericDomain(_))
        ));
        Ok(())
    }

    #[test]
    fn test_base_delay_held_within_episode() -> Result<()> {
        let config = WirelessEnvConfig::default().users(4, 4);
        let mut env = WirelessEnv::build(&config, 11)?;
        env.reset()?;
        let act = WirelessAct(vec![0.5; 8]);
        let (step1, _) = env.step(&act)?;
        let (step2, _) = env.step(&act)?;
        assert_eq!(step1.info.throughput, step2.info.throughput);
        assert_eq!(step1.info.delay, step2.info.delay);
        Ok(())
    }

    #[test]
    fn test_non_finite_config_rejected() {
        let config = WirelessEnvConfig {
            path_loss_a: f64::NAN,
            ..Default::default()
        };
        let err = WirelessEnv::build(&config, 0).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<RadioRlError>(),
            Some(RadioRlError::InvalidConfig(_))
        ));

        let config = WirelessEnvConfig::default().distance(50.0, f64::INFINITY);
        assert!(WirelessEnv::build(&config, 0).is_err());
    }

    #[test]
    fn test_carry_over_transition() -> Result<()> {
        let config = WirelessEnvConfig::default().users(3, 5);
        let mut env = WirelessEnv::build(&config, 6)?;
        let obs = env.reset()?;
        let n = obs.current_users();

        let mut act = WirelessAct::zeros(5);
        act.0[..n].iter_mut().for_each(|v| *v = 0.5);
        act.0[5..5 + n].iter_mut().for_each(|v| *v = 0.25);
        let (step, _) = env.step(&act)?;

        assert_eq!(step.obs.channel_quality(), obs.channel_quality());
        assert_eq!(step.obs.qos_demand(), obs.qos_demand());
        assert!(step.obs.load().iter().all(|v| (v - 0.5).abs() < 1e-6));
        assert!(step.obs.interference().iter().all(|v| (v - 0.25).abs() < 1e-6));
        Ok(())
    }

    #[test]
    fn test_resample_transition() -> Result<()> {
        let config = WirelessEnvConfig::default()
            .users(8, 8)
            .state_transition(StateTransition::Resample);
        let mut env = WirelessEnv::build(&config, 7)?;
        let obs = env.reset()?;
        let (step, _) = env.step(&WirelessAct(vec![0.5; 16]))?;

        assert_eq!(step.obs.current_users(), 8);
        assert_ne!(step.obs.channel_quality(), obs.channel_quality());
        assert!(step.obs.load().iter().all(|v| *v == 0.0));
        Ok(())
    }

    #[test]
    fn test_user_resample_interval() -> Result<()> {
        let config = WirelessEnvConfig::default()
            .users(1, 50)
            .user_resample_interval(3);
        let mut env = WirelessEnv::build(&config, 8)?;

        let mut counts = vec![];
        for _ in 0..30 {
            env.reset()?;
            counts.push(env.current_users());
        }
        for chunk in counts.chunks(3) {
            assert!(chunk.iter().all(|n| *n == chunk[0]));
        }
        let mut distinct = counts.clone();
        distinct.dedup();
        assert!(distinct.len() > 1);
        Ok(())
    }

    #[test]
    fn test_max_steps_truncates() -> Result<()> {
        let config = WirelessEnvConfig::default().users(2, 2).max_steps(Some(3));
        let mut env = WirelessEnv::build(&config, 9)?;
        env.reset()?;
        let act = WirelessAct(vec![0.5; 4]);
        assert!(!env.step(&act)?.0.is_truncated);
        assert!(!env.step(&act)?.0.is_truncated);
        let (step, _) = env.step(&act)?;
        assert!(step.is_truncated);
        assert!(!step.is_terminated);

        env.reset()?;
        assert!(!env.step(&act)?.0.is_truncated);
        Ok(())
    }

    #[test]
    fn test_reset_with_index_is_reproducible() -> Result<()> {
        let config = WirelessEnvConfig::default().users(1, 30);
        let mut env = WirelessEnv::build(&config, 10)?;
        let obs1 = env.reset_with_index(4)?;
        env.reset()?;
        env.reset()?;
        let obs2 = env.reset_with_index(4)?;
        assert_eq!(obs1, obs2);
        Ok(())
    }
}
