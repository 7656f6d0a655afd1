//! Deterministic actor.
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{track, OutDim},
};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`DeterministicActor`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DeterministicActorConfig<P: OutDim> {
    /// Configuration of the policy network.
    pub policy_config: Option<P>,

    /// Configuration of the optimizer.
    pub opt_config: OptimizerConfig,
}

impl<P: OutDim> Default for DeterministicActorConfig<P> {
    fn default() -> Self {
        Self {
            policy_config: None,
            opt_config: OptimizerConfig::Adam { lr: 1e-4 },
        }
    }
}

impl<P> DeterministicActorConfig<P>
where
    P: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for policy function.
    pub fn policy_config(mut self, v: P) -> Self {
        self.policy_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(pi_config) = &mut self.policy_config {
            pi_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Loads [`DeterministicActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DeterministicActorConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Policy network `mu(s)` with its target copy `mu'(s)`.
pub struct DeterministicActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    varmap: VarMap,

    // Never handed to an optimizer.
    varmap_tgt: VarMap,

    out_dim: usize,
    policy: P,
    policy_tgt: P,
    opt: Optimizer,
}

impl<P> DeterministicActor<P>
where
    P: SubModel1<Input = Tensor, Output = Tensor>,
    P::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DeterministicActor`]. The target starts as a copy of the live network.
    pub fn build(config: DeterministicActorConfig<P::Config>, device: &Device) -> Result<Self> {
        let policy_config = config.policy_config.context("policy_config is not set.")?;
        let out_dim = policy_config.get_out_dim();

        let (varmap, policy) = Self::build_policy(&policy_config, device)?;
        let (varmap_tgt, policy_tgt) = Self::build_policy(&policy_config, device)?;
        let opt = config.opt_config.build(varmap.all_vars())?;
        track(&varmap_tgt, &varmap, 1.0)?;

        Ok(Self {
            varmap,
            varmap_tgt,
            out_dim,
            policy,
            policy_tgt,
            opt,
        })
    }

    fn build_policy(policy_config: &P::Config, device: &Device) -> Result<(VarMap, P)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device).pp("actor");
        let policy = P::build(vb, policy_config.clone())?;
        Ok((varmap, policy))
    }

    /// Actions of the live network, shape `(batch_size, out_dim)`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        let act = self.policy.forward(obs)?;
        debug_assert_eq!(act.dims()[1], self.out_dim);
        Ok(act)
    }

    /// Actions of the target network.
    pub fn forward_tgt(&self, obs: &Tensor) -> Result<Tensor> {
        self.policy_tgt.forward(obs)
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

    /// Saves `actor.safetensors` and `actor_tgt.safetensors` in `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let path = dir.as_ref().join("actor.safetensors");
        let path_tgt = dir.as_ref().join("actor_tgt.safetensors");
        self.varmap.save(&path)?;
        self.varmap_tgt.save(&path_tgt)?;
        info!("Save actor parameters to {:?}", path);
        Ok(vec![path, path_tgt])
    }

    /// Loads the files written by [`DeterministicActor::save`].
    pub fn load(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let path = dir.as_ref().join("actor.safetensors");
        self.varmap.load(&path)?;
        self.varmap_tgt.load(dir.as_ref().join("actor_tgt.safetensors"))?;
        info!("Load actor parameters from {:?}", path);
        Ok(())
    }
}
