//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarMap;
use log::trace;
use radio_rl_core::replay_buffer::ArrayBatch;
use serde::{Deserialize, Serialize};

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum CriticLoss {
    /// Mean squared error.
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track with tau = {}", tau);
    let dest = dest.data().lock().map_err(|e| anyhow!("{}", e))?;
    let src = src.data().lock().map_err(|e| anyhow!("{}", e))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("variable {} is not in the source", k_dest))?;
        let t_src = v_src.as_tensor();
        let t_dest = v_dest.as_tensor();
        let t_dest = ((tau * t_src)? + ((1.0 - tau) * t_dest)?)?;
        v_dest.set(&t_dest)?;
    }

    Ok(())
}

/// Evaluates `f` outside of the autograd graph.
///
/// The returned tensor is detached, so no gradient flows back into the
/// variables used in `f`.
pub fn no_grad<F>(f: F) -> Result<Tensor>
where
    F: FnOnce() -> Result<Tensor>,
{
    Ok(f()?.detach())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

/// Interface for reading input dimensions.
pub trait InDim {
    /// Returns the input dimension.
    fn get_in_dim(&self) -> usize;
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let device = x.device();
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?.to_device(device)?;
    let m2 = (m1.ones_like()? - &m1)?;
    (((0.5 * m1)? * d.powf(2.0))? + m2 * (d - 0.5))?.mean_all()
}

/// Converts a batch of row vectors into a tensor of shape `(rows, dim)`.
pub fn batch_to_tensor(batch: ArrayBatch, device: &Device) -> Result<Tensor> {
    let (rows, dim) = (batch.rows(), batch.dim());
    Ok(Tensor::from_vec(batch.into_vec(), (rows, dim), device)?)
}

/// Converts a vector into a tensor of shape `(1, len)`.
pub fn slice_to_tensor(v: &[f32], device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(v, (1, v.len()), device)?)
}

/// Converts rewards into a tensor of shape `(batch_size,)`.
pub fn reward(reward: Vec<f32>, device: &Device) -> Result<Tensor> {
    let batch_size = reward.len();
    Ok(Tensor::from_vec(reward, (batch_size,), device)?)
}

/// Returns all variables of a [`VarMap`] as name-sorted flat vectors.
pub fn flat_params(varmap: &VarMap) -> Result<Vec<(String, Vec<f32>)>> {
    let data = varmap.data().lock().map_err(|e| anyhow!("{}", e))?;
    let mut params = data
        .iter()
        .map(|(k, v)| -> Result<(String, Vec<f32>)> {
            Ok((k.clone(), v.as_tensor().flatten_all()?.to_vec1::<f32>()?))
        })
        .collect::<Result<Vec<_>>>()?;
    params.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::Init;

    fn varmap_with(values: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((values.len(),), "var1", init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(values, (values.len(),), &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        Ok(vm)
    }

    #[test]
    fn test_track() -> Result<()> {
        let tau = 0.7;
        let vm_src = varmap_with(&[1.0, 2.0, 3.0])?;
        let vm_dest = varmap_with(&[4.0, 5.0, 6.0])?;
        track(&vm_dest, &vm_src, tau)?;

        let t = flat_params(&vm_dest)?.remove(0).1;
        let expected = [1.9f32, 2.9, 3.9];
        for (a, b) in t.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_track_extremes() -> Result<()> {
        let vm_src = varmap_with(&[1.0, -2.0, 0.125])?;
        let vm_dest = varmap_with(&[4.0, 5.0, 6.0])?;

        track(&vm_dest, &vm_src, 0.0)?;
        assert_eq!(flat_params(&vm_dest)?[0].1, vec![4.0, 5.0, 6.0]);

        track(&vm_dest, &vm_src, 1.0)?;
        assert_eq!(flat_params(&vm_dest)?[0].1, vec![1.0, -2.0, 0.125]);
        Ok(())
    }

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0.0f32, 0.0], (2,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.5f32, 3.0], (2,), &Device::Cpu)?;
        let loss = smooth_l1_loss(&x, &y)?.to_scalar::<f32>()?;
        // (0.5 * 0.25 + (3.0 - 0.5)) / 2
        assert!((loss - 1.3125).abs() < 1e-6);
        Ok(())
    }
}
