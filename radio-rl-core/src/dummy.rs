//! A counting environment and a trivial agent used by tests.
use crate::{
    record::Record,
    replay_buffer::{
        ArrayBatch, GenericTransitionBatch, ReplayBuffer, ReplayBufferConfig,
        SimpleStepProcessor,
    },
    Act, Agent, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase, Step,
};
use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct DummyObs(pub Vec<f32>);

impl Obs for DummyObs {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<DummyObs> for ArrayBatch {
    fn from(obs: DummyObs) -> Self {
        ArrayBatch::from_row(obs.0)
    }
}

#[derive(Clone, Debug)]
pub struct DummyAct(pub Vec<f32>);

impl Act for DummyAct {
    fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<DummyAct> for ArrayBatch {
    fn from(act: DummyAct) -> Self {
        ArrayBatch::from_row(act.0)
    }
}

pub struct DummyInfo;

impl Info for DummyInfo {}

#[derive(Clone)]
pub struct DummyEnvConfig {
    pub episode_len: usize,
}

/// Observes the step count, pays 1 per step and truncates after `episode_len` steps.
pub struct DummyEnv {
    episode_len: usize,
    t: usize,
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = DummyInfo;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            episode_len: config.episode_len,
            t: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.t += 1;
        let obs = DummyObs(vec![self.t as f32, 0.0]);
        let is_truncated = self.t >= self.episode_len;
        let step = Step::new(obs, a.clone(), 1.0, false, is_truncated, DummyInfo);
        Ok((step, Record::from_scalar("t", self.t as f32)))
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        self.t = 0;
        Ok(DummyObs(vec![0.0, 0.0]))
    }

    fn reset_with_index(&mut self, _ix: usize) -> Result<Self::Obs> {
        self.reset()
    }
}

pub type DummyStepProcessor = SimpleStepProcessor<DummyEnv, ArrayBatch, ArrayBatch>;

type DummyBuffer = ReplayBuffer<ArrayBatch, ArrayBatch>;

/// Counts optimization steps taken with at least `batch_size` stored transitions.
pub struct DummyAgent {
    buffer: DummyBuffer,
    batch_size: usize,
    train: bool,
    pub n_opts: usize,
}

impl DummyAgent {
    pub fn new(batch_size: usize) -> Self {
        let config = ReplayBufferConfig::default().capacity(1000);
        Self {
            buffer: DummyBuffer::build(&config).unwrap(),
            batch_size,
            train: false,
            n_opts: 0,
        }
    }
}

impl Policy<DummyEnv> for DummyAgent {
    fn sample(&mut self, _obs: &DummyObs) -> Result<DummyAct> {
        Ok(DummyAct(vec![0.5]))
    }
}

impl Agent<DummyEnv> for DummyAgent {
    type Buffer = DummyBuffer;

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

    fn save_experience(&mut self, tr: GenericTransitionBatch<ArrayBatch, ArrayBatch>) -> Result<()> {
        self.buffer.push(tr)
    }

    fn opt_with_record(&mut self) -> Result<Option<Record>> {
        if self.buffer.len() < self.batch_size {
            return Ok(None);
        }
        let _batch = self.buffer.batch(self.batch_size)?;
        self.n_opts += 1;
        Ok(Some(Record::from_scalar("loss", 0.0)))
    }

    fn save_params(&self, path: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(path)?;
        let path = path.join("dummy.txt");
        std::fs::write(&path, format!("{}", self.n_opts))?;
        Ok(vec![path])
    }

    fn load_params(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
