//! Train [`Agent`].
mod config;
mod sampler;
use crate::{
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    Agent, Env, Evaluator, ExperienceBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
pub use sampler::{Sample, Sampler};
use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

/// Key of the evaluation score in records returned by evaluators.
pub const EVAL_REWARD_KEY: &str = "eval_reward";

/// Manages the training loop.
///
/// Training runs episode by episode. Every step of an episode goes through
/// the following:
///
/// ```mermaid
/// graph LR
///     A[Sampler] -->|action| B[Env]
///     B -->|Step| C[StepProcessor]
///     C -->|transition| D[Agent::save_experience]
///     D --> E[Agent::opt_with_record]
/// ```
///
/// 1. The [`Sampler`] asks the agent for an action on the previous
///    observation and applies it to the environment.
/// 2. The step processor turns the resulting [`Step`](crate::Step) into a
///    transition, which is pushed into the agent's replay buffer.
/// 3. Once `warmup_period` environment steps have been taken, the agent
///    performs one optimization step. Below one batch of stored transitions
///    the step is a no-op.
///
/// After each episode the trainer stores `episode`, `episode_return`,
/// `episode_steps` and the diagnostics of the last step and optimization
/// step. Every `eval_interval` episodes the agent is evaluated in
/// evaluation mode, and the parameters with the best
/// [`EVAL_REWARD_KEY`] so far are saved in `model_dir/best`. Every
/// `save_interval` episodes the parameters are saved in
/// `model_dir/<episode>`.
#[cfg_attr(doc, aquamarine::aquamarine)]
pub struct Trainer {
    model_dir: Option<PathBuf>,
    n_episodes: usize,
    max_steps_per_episode: usize,
    eval_interval: usize,
    save_interval: usize,
    record_interval: usize,
    warmup_period: usize,

    /// Optimization steps since the last query of [`Trainer::opt_steps_per_sec`].
    opt_steps_for_ops: usize,

    timer_for_ops: Duration,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self {
            model_dir: config.model_dir,
            n_episodes: config.n_episodes,
            max_steps_per_episode: config.max_steps_per_episode,
            eval_interval: config.eval_interval,
            save_interval: config.save_interval,
            record_interval: config.record_interval,
            warmup_period: config.warmup_period,
            opt_steps_for_ops: 0,
            timer_for_ops: Duration::new(0, 0),
        }
    }

    fn save_model<E: Env, A: Agent<E>>(agent: &A, model_dir: &Path) {
        match agent.save_params(model_dir) {
            Ok(_) => info!("Saved the model in {:?}", model_dir),
            Err(e) => warn!("Failed to save model in {:?}: {}", model_dir, e),
        }
    }

    fn save_best_model<E: Env, A: Agent<E>>(&self, agent: &A) {
        if let Some(model_dir) = &self.model_dir {
            Self::save_model::<E, A>(agent, &model_dir.join("best"));
        }
    }

    fn save_model_with_episode<E: Env, A: Agent<E>>(&self, agent: &A, episode: usize) {
        if let Some(model_dir) = &self.model_dir {
            Self::save_model::<E, A>(agent, &model_dir.join(episode.to_string()));
        }
    }

    fn opt_steps_per_sec(&mut self) -> f32 {
        let millis = self.timer_for_ops.as_millis() as f32;
        let osps = if millis > 0.0 {
            1000. * self.opt_steps_for_ops as f32 / millis
        } else {
            0.0
        };
        self.opt_steps_for_ops = 0;
        self.timer_for_ops = Duration::new(0, 0);
        osps
    }

    /// Performs one environment step followed by an optimization step.
    ///
    /// Returns the merged record of the environment and the agent, the reward
    /// of the step and whether the episode ended.
    pub fn train_step<E, P, A>(
        &mut self,
        agent: &mut A,
        sampler: &mut Sampler<E, P>,
        env_steps: &mut usize,
        opt_steps: &mut usize,
    ) -> Result<(Record, f32, bool)>
    where
        E: Env,
        P: StepProcessor<E>,
        A: Agent<E>,
        A::Buffer: ExperienceBufferBase<Item = P::Output>,
    {
        let Sample {
            mut record,
            reward,
            is_done,
        } = sampler.sample_and_push(agent)?;
        *env_steps += 1;

        if *env_steps >= self.warmup_period {
            let timer = SystemTime::now();
            if let Some(record_agent) = agent.opt_with_record()? {
                *opt_steps += 1;
                self.timer_for_ops += timer.elapsed()?;
                self.opt_steps_for_ops += 1;
                record = record.merge(record_agent);
            }
        }

        Ok((record, reward, is_done))
    }

    /// Trains the agent.
    ///
    /// `env` is the training environment; the evaluator owns its own.
    pub fn train<E, P, A, D>(
        &mut self,
        env: E,
        step_proc: P,
        agent: &mut A,
        recorder: &mut dyn AggregateRecorder,
        evaluator: &mut D,
    ) -> Result<()>
    where
        E: Env,
        P: StepProcessor<E>,
        A: Agent<E>,
        A::Buffer: ExperienceBufferBase<Item = P::Output>,
        D: Evaluator<E>,
    {
        let mut sampler = Sampler::new(env, step_proc);
        let mut max_eval_reward = f32::MIN;
        let mut env_steps: usize = 0;
        let mut opt_steps: usize = 0;
        agent.train();

        for episode in 1..=self.n_episodes {
            sampler.reset()?;
            let mut episode_return = 0f32;
            let mut episode_steps = 0;
            let mut record = Record::empty();

            for _ in 0..self.max_steps_per_episode {
                let (record_step, reward, is_done) =
                    self.train_step(agent, &mut sampler, &mut env_steps, &mut opt_steps)?;
                episode_return += reward;
                episode_steps += 1;
                record.merge_inplace(record_step);
                if is_done {
                    break;
                }
            }

            record.insert("episode", Scalar(episode as f32));
            record.insert("episode_return", Scalar(episode_return));
            record.insert("episode_steps", Scalar(episode_steps as f32));
            record.insert("opt_steps", Scalar(opt_steps as f32));
            record.insert("buffer_len", Scalar(agent.buffer().len() as f32));

            if self.record_interval > 0 && episode % self.record_interval == 0 {
                record.insert("opt_steps_per_sec", Scalar(self.opt_steps_per_sec()));
                info!(
                    "Episode {}, return {:.3}, env steps {}, opt steps {}",
                    episode, episode_return, env_steps, opt_steps
                );
            }

            if self.eval_interval > 0 && episode % self.eval_interval == 0 {
                info!("Starts evaluation of the trained model");
                agent.eval();
                let record_eval = evaluator.evaluate(agent)?;
                agent.train();

                let eval_reward = record_eval.get_scalar(EVAL_REWARD_KEY)?;
                info!("Episode {}, {} {:.3}", episode, EVAL_REWARD_KEY, eval_reward);
                if eval_reward > max_eval_reward {
                    max_eval_reward = eval_reward;
                    self.save_best_model::<E, A>(agent);
                }
                record.merge_inplace(record_eval);
            }

            if self.save_interval > 0 && episode % self.save_interval == 0 {
                self.save_model_with_episode::<E, A>(agent, episode);
            }

            recorder.store(record);
            if self.record_interval > 0 && episode % self.record_interval == 0 {
                recorder.flush(episode as _);
            }
        }

        Ok(())
    }
}
