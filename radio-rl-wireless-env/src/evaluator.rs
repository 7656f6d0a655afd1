//! Network-level evaluation of policies.
use crate::{WirelessEnv, WirelessEnvConfig};
use anyhow::Result;
use log::info;
use radio_rl_core::{
    record::{Record, RecordValue},
    trainer::EVAL_REWARD_KEY,
    Env, Evaluator, Policy,
};
use serde::Serialize;

const EPS: f32 = 1e-6;

/// Jain's fairness index `(sum x)^2 / (n * sum x^2)`.
///
/// Returns 0 when the sum is 0, including for an empty slice.
pub fn jain_index(xs: &[f32]) -> f32 {
    let sum: f32 = xs.iter().sum();
    if sum == 0.0 {
        return 0.0;
    }
    let sum_sq: f32 = xs.iter().map(|x| x * x).sum();
    sum * sum / (xs.len() as f32 * sum_sq)
}

/// Metrics of one evaluation episode, each the mean over its steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QosMetrics {
    /// Index of the episode.
    pub episode: usize,

    /// Number of active users.
    pub current_users: usize,

    /// Sum of rewards.
    pub episode_return: f32,

    /// Total throughput of the cell.
    pub throughput: f32,

    /// Mean delay of a user.
    pub delay: f32,

    /// Mean packet loss of a user.
    pub packet_loss: f32,

    /// Mean transmit power of a user.
    pub power_usage: f32,

    /// Total throughput per total power.
    pub energy_efficiency: f32,

    /// Jain's fairness index of throughputs.
    pub fairness: f32,
}

impl QosMetrics {
    fn add_step(&mut self, throughput: &[f32], delay: &[f32], loss: &[f32], power: &[f32]) {
        let n = throughput.len().max(1) as f32;
        let tp_total: f32 = throughput.iter().sum();
        let p_total: f32 = power.iter().sum();

        self.throughput += tp_total;
        self.delay += delay.iter().sum::<f32>() / n;
        self.packet_loss += loss.iter().sum::<f32>() / n;
        self.power_usage += p_total / n;
        self.energy_efficiency += tp_total / (p_total + EPS);
        self.fairness += jain_index(throughput);
    }

    fn average(&mut self, n_steps: usize) {
        let n = n_steps.max(1) as f32;
        self.throughput /= n;
        self.delay /= n;
        self.packet_loss /= n;
        self.power_usage /= n;
        self.energy_efficiency /= n;
        self.fairness /= n;
    }

    fn mean_of(history: &[Self]) -> Self {
        let n = history.len().max(1) as f32;
        let mut m = Self::default();
        for h in history.iter() {
            m.episode_return += h.episode_return / n;
            m.throughput += h.throughput / n;
            m.delay += h.delay / n;
            m.packet_loss += h.packet_loss / n;
            m.power_usage += h.power_usage / n;
            m.energy_efficiency += h.energy_efficiency / n;
            m.fairness += h.fairness / n;
        }
        m
    }
}

/// Evaluates a policy on [`WirelessEnv`] and reports QoS metrics.
///
/// Episode `ix` starts from [`Env::reset_with_index`], so every evaluation
/// sees the same user sets. The returned record holds the mean over episodes
/// of the episode return under [`EVAL_REWARD_KEY`] and of every field of
/// [`QosMetrics`] under its own name.
pub struct QosEvaluator {
    n_episodes: usize,
    max_steps: usize,
    env: WirelessEnv,
    history: Vec<QosMetrics>,
}

impl QosEvaluator {
    /// Builds the evaluation environment.
    pub fn new(
        config: &WirelessEnvConfig,
        seed: i64,
        n_episodes: usize,
        max_steps: usize,
    ) -> Result<Self> {
        Ok(Self {
            n_episodes,
            max_steps,
            env: WirelessEnv::build(config, seed)?,
            history: vec![],
        })
    }

    /// Per-episode metrics of the last evaluation.
    pub fn history(&self) -> &[QosMetrics] {
        &self.history
    }
}

impl Evaluator<WirelessEnv> for QosEvaluator {
    fn evaluate<P: Policy<WirelessEnv>>(&mut self, policy: &mut P) -> Result<Record> {
        self.history.clear();

        for ix in 0..self.n_episodes {
            let mut obs = self.env.reset_with_index(ix)?;
            let mut metrics = QosMetrics {
                episode: ix,
                current_users: self.env.current_users(),
                ..Default::default()
            };
            let mut n_steps = 0;

            for _ in 0..self.max_steps {
                let act = policy.sample(&obs)?;
                let (step, _) = self.env.step(&act)?;
                let info = &step.info;
                metrics.episode_return += step.reward;
                metrics.add_step(&info.throughput, &info.delay, &info.packet_loss, &info.power);
                n_steps += 1;
                if step.is_done() {
                    break;
                }
                obs = step.obs;
            }

            metrics.average(n_steps);
            info!(
                "Eval episode {}, users {}, throughput {:.3} Mbps, fairness {:.3}",
                ix, metrics.current_users, metrics.throughput, metrics.fairness
            );
            self.history.push(metrics);
        }

        let m = QosMetrics::mean_of(&self.history);
        Ok(Record::from_slice(&[
            (EVAL_REWARD_KEY, RecordValue::Scalar(m.episode_return)),
            ("throughput", RecordValue::Scalar(m.throughput)),
            ("delay", RecordValue::Scalar(m.delay)),
            ("packet_loss", RecordValue::Scalar(m.packet_loss)),
            ("power_usage", RecordValue::Scalar(m.power_usage)),
            ("energy_efficiency", RecordValue::Scalar(m.energy_efficiency)),
            ("fairness", RecordValue::Scalar(m.fairness)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Scheduler, SchedulerMode};

    #[test]
    fn test_jain_index() {
        assert_eq!(jain_index(&[2.0, 2.0, 2.0, 2.0]), 1.0);
        assert!((jain_index(&[3.0, 0.0, 0.0, 0.0]) - 0.25).abs() < 1e-6);
        assert_eq!(jain_index(&[0.0, 0.0]), 0.0);
        assert_eq!(jain_index(&[]), 0.0);
        let j = jain_index(&[1.0, 2.0, 3.0]);
        assert!(j > 1.0 / 3.0 && j < 1.0);
    }

    #[test]
    fn test_qos_evaluator() -> Result<()> {
        let config = WirelessEnvConfig::default().users(2, 10);
        let mut evaluator = QosEvaluator::new(&config, 0, 3, 5)?;
        let mut scheduler = Scheduler::new(10, SchedulerMode::EqualPower);

        let record = evaluator.evaluate(&mut scheduler)?;
        assert_eq!(evaluator.history().len(), 3);
        for m in evaluator.history() {
            assert!((2..=10).contains(&m.current_users));
            // equal power of 0.5 * 20 W
            assert!((m.power_usage - 10.0).abs() < 1e-4);
            // 0.25 - 0.2 / n
            let loss = 0.25 - 0.2 / m.current_users as f32;
            assert!((m.packet_loss - loss).abs() < 1e-5);
            assert!(m.fairness > 0.0 && m.fairness <= 1.0 + 1e-6);
        }
        assert!(record.get_scalar(EVAL_REWARD_KEY)?.is_finite());
        assert!((record.get_scalar("power_usage")? - 10.0).abs() < 1e-4);

        // the same episodes are replayed on every evaluation
        let history = evaluator.history().to_vec();
        evaluator.evaluate(&mut scheduler)?;
        let users: Vec<usize> = evaluator.history().iter().map(|m| m.current_users).collect();
        let users_: Vec<usize> = history.iter().map(|m| m.current_users).collect();
        assert_eq!(users, users_);
        Ok(())
    }
}
