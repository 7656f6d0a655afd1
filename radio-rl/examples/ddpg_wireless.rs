use anyhow::Result;
use clap::Parser;
use csv::WriterBuilder;
use log::info;
use radio_rl::util::{ddpg_config, WirelessDdpg, WirelessStepProcessor, HIDDEN_UNITS};
use radio_rl_core::{
    record::{BufferedRecorder, Record},
    replay_buffer::SimpleStepProcessorConfig,
    Agent, Configurable, Env as _, Evaluator as _, StepProcessor, Trainer, TrainerConfig,
};
use radio_rl_wireless_env::{QosEvaluator, WirelessEnv, WirelessEnvConfig};
use serde::Serialize;
use std::{convert::TryFrom, fs::File, path::Path};

const REPLAY_BUFFER_CAPACITY: usize = 1_000_000;
const N_EPISODES_PER_EVAL: usize = 5;

#[derive(Debug, Serialize)]
struct TrainRecord {
    episode: usize,
    episode_return: f32,
    current_users: usize,
    loss_critic: Option<f32>,
    loss_actor: Option<f32>,
    eval_reward: Option<f32>,
}

impl TryFrom<&Record> for TrainRecord {
    type Error = anyhow::Error;

    fn try_from(record: &Record) -> Result<Self> {
        Ok(Self {
            episode: record.get_scalar("episode")? as _,
            episode_return: record.get_scalar("episode_return")?,
            current_users: record.get_scalar("current_users")? as _,
            loss_critic: record.get_scalar("loss_critic").ok(),
            loss_actor: record.get_scalar("loss_actor").ok(),
            eval_reward: record.get_scalar("eval_reward").ok(),
        })
    }
}

/// Train/eval DDPG agent in the wireless environment
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    /// Train DDPG agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate DDPG agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Directory where models and reports are saved
    #[arg(long, default_value = "./radio-rl/examples/model/ddpg_wireless")]
    model_dir: String,

    /// Number of training episodes
    #[arg(long, default_value_t = 1000)]
    episodes: usize,

    /// Steps per episode
    #[arg(long, default_value_t = 200)]
    max_steps: usize,

    /// Maximum number of users
    #[arg(long, default_value_t = 50)]
    max_users: usize,

    /// Minimum number of users
    #[arg(long, default_value_t = 10)]
    min_users: usize,

    /// Episodes between evaluations
    #[arg(long, default_value_t = 50)]
    eval_interval: usize,

    /// Batch size of the agent
    #[arg(long, default_value_t = 128)]
    batch_size: usize,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn env_config(args: &Args) -> WirelessEnvConfig {
    WirelessEnvConfig::default().users(args.min_users, args.max_users)
}

fn create_agent(args: &Args, env_config: &WirelessEnvConfig) -> Result<WirelessDdpg> {
    let config = ddpg_config(env_config, &HIDDEN_UNITS, REPLAY_BUFFER_CAPACITY)
        .batch_size(args.batch_size)
        .seed(args.seed);
    WirelessDdpg::build(config)
}

fn write_train_csv(recorder: &BufferedRecorder, path: impl AsRef<Path>) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(File::create(path)?);
    for record in recorder.iter() {
        wtr.serialize(TrainRecord::try_from(record)?)?;
    }
    wtr.flush()?;
    Ok(())
}

fn train(args: &Args) -> Result<()> {
    let model_dir = Path::new(&args.model_dir);
    std::fs::create_dir_all(model_dir)?;

    let env_config = env_config(args);
    env_config.save(model_dir.join("env.yaml"))?;
    let trainer_config = TrainerConfig::default()
        .n_episodes(args.episodes)
        .max_steps_per_episode(args.max_steps)
        .eval_interval(args.eval_interval)
        .record_interval(1)
        .model_dir(model_dir);
    trainer_config.save(model_dir.join("trainer.yaml"))?;

    let env = WirelessEnv::build(&env_config, args.seed as i64)?;
    let step_proc = WirelessStepProcessor::build(&SimpleStepProcessorConfig::default());
    let mut agent = create_agent(args, &env_config)?;
    let mut recorder = BufferedRecorder::new();
    let mut evaluator = QosEvaluator::new(
        &env_config,
        args.seed as i64 + 1,
        N_EPISODES_PER_EVAL,
        args.max_steps,
    )?;

    let mut trainer = Trainer::build(trainer_config);
    trainer.train(env, step_proc, &mut agent, &mut recorder, &mut evaluator)?;

    write_train_csv(&recorder, model_dir.join("train.csv"))?;
    info!("Saved training records in {:?}", model_dir.join("train.csv"));
    Ok(())
}

fn eval(args: &Args, n_episodes: usize) -> Result<()> {
    let model_dir = Path::new(&args.model_dir);
    let env_config = env_config(args);
    let mut agent = {
        let mut agent = create_agent(args, &env_config)?;
        agent.load_params(&model_dir.join("best"))?;
        Agent::<WirelessEnv>::eval(&mut agent);
        agent
    };

    let mut evaluator =
        QosEvaluator::new(&env_config, args.seed as i64 + 1, n_episodes, args.max_steps)?;
    let record = evaluator.evaluate(&mut agent)?;
    info!(
        "eval_reward {:.3}, throughput {:.3} Mbps, fairness {:.3}",
        record.get_scalar("eval_reward")?,
        record.get_scalar("throughput")?,
        record.get_scalar("fairness")?
    );

    let mut wtr = WriterBuilder::new().from_writer(File::create(model_dir.join("eval.csv"))?);
    for m in evaluator.history() {
        wtr.serialize(m)?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.train {
        train(&args)?;
    } else if args.eval {
        eval(&args, N_EPISODES_PER_EVAL)?;
    } else {
        train(&args)?;
        eval(&args, N_EPISODES_PER_EVAL)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_ddpg_wireless() -> Result<()> {
        let model_dir = TempDir::new("ddpg_wireless")?;
        let args = Args {
            train: false,
            eval: false,
            model_dir: model_dir.path().to_str().unwrap().to_string(),
            episodes: 4,
            max_steps: 10,
            max_users: 4,
            min_users: 2,
            eval_interval: 2,
            batch_size: 8,
            seed: 0,
        };
        train(&args)?;
        eval(&args, 1)?;

        let path = model_dir.path();
        assert!(path.join("best").join("actor.safetensors").exists());
        assert!(path.join("train.csv").exists());
        assert!(path.join("eval.csv").exists());
        Ok(())
    }
}
