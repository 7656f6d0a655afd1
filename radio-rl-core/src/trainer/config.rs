//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// Training runs `n_episodes` episodes of at most `max_steps_per_episode`
/// environment steps each. Intervals are counted in episodes.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub n_episodes: usize,

    /// Step budget of an episode.
    pub max_steps_per_episode: usize,

    /// Interval of evaluation in episodes.
    pub eval_interval: usize,

    /// Interval of saving model parameters in episodes.
    pub save_interval: usize,

    /// Interval of flushing records in episodes.
    pub record_interval: usize,

    /// The number of environment steps before the first optimization step.
    pub warmup_period: usize,

    /// Directory where model parameters are saved.
    pub model_dir: Option<PathBuf>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_episodes: 1000,
            max_steps_per_episode: 200,
            eval_interval: 50,
            save_interval: usize::MAX,
            record_interval: 1,
            warmup_period: 0,
            model_dir: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn n_episodes(mut self, v: usize) -> Self {
        self.n_episodes = v;
        self
    }

    /// Sets the step budget of an episode.
    pub fn max_steps_per_episode(mut self, v: usize) -> Self {
        self.max_steps_per_episode = v;
        self
    }

    /// Sets the interval of evaluation in episodes.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of saving in episodes.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the interval of flushing records in episodes.
    pub fn record_interval(mut self, v: usize) -> Self {
        self.record_interval = v;
        self
    }

    /// Sets the warmup period in environment steps.
    pub fn warmup_period(mut self, v: usize) -> Self {
        self.warmup_period = v;
        self
    }

    /// Sets the directory where model parameters are saved.
    pub fn model_dir(mut self, model_dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .n_episodes(100)
            .eval_interval(10)
            .warmup_period(64)
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
