//! Multilayer perceptron.
mod base;
mod config;
use crate::Activation;
use anyhow::Result;
pub use base::Mlp;
use candle_core::Tensor;
use candle_nn::{Linear, Module};
pub use config::MlpConfig;

fn mlp_forward(
    xs: Tensor,
    layers: &[Linear],
    hidden_act: &Activation,
    final_act: &Activation,
) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for (i, layer) in layers.iter().enumerate() {
        xs = layer.forward(&xs)?;
        xs = if i + 1 < n_layers {
            hidden_act.forward(&xs)?
        } else {
            final_act.forward(&xs)?
        };
    }

    Ok(xs)
}
