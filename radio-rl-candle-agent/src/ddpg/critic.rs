//! Critic of DDPG.
use crate::{
    model::SubModel2,
    opt::{Optimizer, OptimizerConfig},
    util::track,
};
use anyhow::{Context, Result};
use candle_core::{DType::F32, Device, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`Critic`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CriticConfig<Q> {
    /// Configuration of the action-value network.
    pub q_config: Option<Q>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<Q> Default for CriticConfig<Q> {
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-3 },
        }
    }
}

impl<Q> CriticConfig<Q>
where
    Q: DeserializeOwned + Serialize,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Loads [`CriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value network `Q(s, a)` with its target copy `Q'(s, a)`.
pub struct Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    varmap: VarMap,
    varmap_tgt: VarMap, // for target network
    q: Q,
    q_tgt: Q,
    opt: Optimizer, // no optimizer required for the target network
}

impl<Q> Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + Clone,
{
    /// Constructs [`Critic`]. The target starts as a copy of the live network.
    pub fn build(config: CriticConfig<Q::Config>, device: &Device) -> Result<Self> {
        let q_config = config.q_config.context("q_config is not set.")?;

        let (varmap, q) = Self::build_critic_network(&q_config, device)?;
        let (varmap_tgt, q_tgt) = Self::build_critic_network(&q_config, device)?;
        let opt = config.opt_config.build(varmap.all_vars())?;
        track(&varmap_tgt, &varmap, 1.0)?;

        Ok(Self {
            varmap,
            varmap_tgt,
            q,
            q_tgt,
            opt,
        })
    }

    fn build_critic_network(q_config: &Q::Config, device: &Device) -> Result<(VarMap, Q)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, F32, device).pp("critic");
        let q = Q::build(vb, q_config.clone())?;
        Ok((varmap, q))
    }

    /// Action values of the live network, shape `(batch_size,)`.
    pub fn qvals(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Ok(self.q.forward(obs, act)?.squeeze(D::Minus1)?)
    }

    /// Action values of the target network, shape `(batch_size,)`.
    pub fn qvals_tgt(&self, obs: &Tensor, act: &Tensor) -> Result<Tensor> {
        Ok(self.q_tgt.forward(obs, act)?.squeeze(D::Minus1)?)
    }

    /// Steps the optimizer of the live network.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// Moves the target parameters towards the live ones.
    pub fn soft_update(&mut self, tau: f64) -> Result<()> {
        track(&self.varmap_tgt, &self.varmap, tau)
    }

    pub(crate) fn varmaps(&self) -> (&VarMap, &VarMap) {
        (&self.varmap, &self.varmap_tgt)
    }

    /// Saves `critic.safetensors` and `critic_tgt.safetensors` in `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let path = dir.as_ref().join("critic.safetensors");
        let path_tgt = dir.as_ref().join("critic_tgt.safetensors");
        self.varmap.save(&path)?;
        info!("Save critic to {:?}", path);
        self.varmap_tgt.save(&path_tgt)?;
        info!("Save target critic to {:?}", path_tgt);
        Ok(vec![path, path_tgt])
    }

    /// Loads the files written by [`Critic::save`].
    pub fn load(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let path = dir.as_ref().join("critic.safetensors");
        self.varmap.load(&path)?;
        info!("Load critic from {:?}", path);
        let path_tgt = dir.as_ref().join("critic_tgt.safetensors");
        self.varmap_tgt.load(&path_tgt)?;
        info!("Load target critic from {:?}", path_tgt);
        Ok(())
    }
}
