use anyhow::Result;
use clap::Parser;
use csv::WriterBuilder;
use log::{info, warn};
use radio_rl::util::{ddpg_config, improvement, WirelessDdpg, HIDDEN_UNITS};
use radio_rl_core::{record::Record, Agent, Configurable, Evaluator as _, Policy};
use radio_rl_wireless_env::{
    QosEvaluator, QosMetrics, Scheduler, SchedulerMode, WirelessEnv, WirelessEnvConfig,
};
use serde::Serialize;
use std::{fs::File, path::Path};

const METRICS: [&str; 7] = [
    "eval_reward",
    "throughput",
    "delay",
    "packet_loss",
    "power_usage",
    "energy_efficiency",
    "fairness",
];

#[derive(Debug, Serialize)]
struct ComparisonRecord<'a> {
    policy: &'a str,
    episode: usize,
    current_users: usize,
    episode_return: f32,
    throughput: f32,
    delay: f32,
    packet_loss: f32,
    power_usage: f32,
    energy_efficiency: f32,
    fairness: f32,
}

impl<'a> ComparisonRecord<'a> {
    fn new(policy: &'a str, m: &QosMetrics) -> Self {
        Self {
            policy,
            episode: m.episode,
            current_users: m.current_users,
            episode_return: m.episode_return,
            throughput: m.throughput,
            delay: m.delay,
            packet_loss: m.packet_loss,
            power_usage: m.power_usage,
            energy_efficiency: m.energy_efficiency,
            fairness: m.fairness,
        }
    }
}

/// Compare a trained DDPG agent with a heuristic scheduler
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory holding the trained parameters
    #[arg(long, default_value = "./radio-rl/examples/model/ddpg_wireless/best")]
    model_dir: String,

    /// Number of evaluation episodes
    #[arg(long, default_value_t = 100)]
    episodes: usize,

    /// Steps per episode
    #[arg(long, default_value_t = 200)]
    max_steps: usize,

    /// Maximum number of users, as in training
    #[arg(long, default_value_t = 50)]
    max_users: usize,

    /// Minimum number of users
    #[arg(long, default_value_t = 10)]
    min_users: usize,

    /// Scheduler: round_robin, fixed_rb, equal_power or channel_aware
    #[arg(long, default_value_t = SchedulerMode::ChannelAware)]
    mode: SchedulerMode,

    /// Random seed of the evaluation episodes
    #[arg(long, default_value_t = 0)]
    seed: i64,

    /// Path of the CSV report
    #[arg(long, default_value = "comparison.csv")]
    out: String,
}

fn evaluate<P: Policy<WirelessEnv>>(
    policy: &mut P,
    env_config: &WirelessEnvConfig,
    args: &Args,
) -> Result<(Record, Vec<QosMetrics>)> {
    let mut evaluator = QosEvaluator::new(env_config, args.seed, args.episodes, args.max_steps)?;
    let record = evaluator.evaluate(policy)?;
    Ok((record, evaluator.history().to_vec()))
}

fn load_agent(env_config: &WirelessEnvConfig, model_dir: &Path) -> Result<WirelessDdpg> {
    let mut agent = WirelessDdpg::build(ddpg_config(env_config, &HIDDEN_UNITS, 1_024))?;
    if model_dir.exists() {
        agent.load_params(model_dir)?;
    } else {
        warn!("{:?} does not exist, evaluating an untrained agent", model_dir);
    }
    Agent::<WirelessEnv>::eval(&mut agent);
    Ok(agent)
}

fn compare(args: &Args) -> Result<Vec<(String, f32, f32, Option<f32>)>> {
    let env_config = WirelessEnvConfig::default().users(args.min_users, args.max_users);

    info!("Evaluating DDPG agent");
    let mut agent = load_agent(&env_config, Path::new(&args.model_dir))?;
    let (record_rl, history_rl) = evaluate(&mut agent, &env_config, args)?;

    info!("Evaluating {} scheduler", args.mode);
    let mut scheduler = Scheduler::new(args.max_users, args.mode);
    let (record_base, history_base) = evaluate(&mut scheduler, &env_config, args)?;

    let mut wtr = WriterBuilder::new().from_writer(File::create(&args.out)?);
    for m in history_rl.iter() {
        wtr.serialize(ComparisonRecord::new("ddpg", m))?;
    }
    for m in history_base.iter() {
        wtr.serialize(ComparisonRecord::new(args.mode.name(), m))?;
    }
    wtr.flush()?;

    let mut report = vec![];
    for metric in METRICS.iter() {
        let rl = record_rl.get_scalar(metric)?;
        let base = record_base.get_scalar(metric)?;
        let imp = improvement(metric, rl, base);
        match imp {
            Some(imp) => info!(
                "{:<18} DDPG: {:>10.3} | {}: {:>10.3} | {:+.1}%",
                metric,
                rl,
                args.mode,
                base,
                100.0 * imp
            ),
            None => info!(
                "{:<18} DDPG: {:>10.3} | {}: {:>10.3}",
                metric, rl, args.mode, base
            ),
        }
        report.push((metric.to_string(), rl, base, imp));
    }

    Ok(report)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    compare(&args)?;

    Ok(())
}
