//! DDPG agent implemented with [candle](https://crates.io/crates/candle-core).
//!
//! The agent ([`ddpg::Ddpg`]) learns a deterministic policy over normalized
//! allocation vectors. Its networks are [`mlp::Mlp`]s built through the
//! [`model::SubModel1`] and [`model::SubModel2`] interfaces, so other network
//! architectures can be plugged in.
pub mod ddpg;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod util;
use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    ///
    /// The `usize` field is the ordinal of the device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Opens the corresponding candle device.
    pub fn to_candle(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}

/// Activation functions of [`mlp::Mlp`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum Activation {
    /// Identity.
    None,

    /// Rectified linear unit.
    ReLU,

    /// Leaky ReLU with the given negative slope.
    LeakyReLU(f64),

    /// Logistic sigmoid, bounding outputs to (0, 1).
    Sigmoid,

    /// Hyperbolic tangent.
    Tanh,
}

impl Activation {
    /// Applies the activation function.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(match self {
            Self::None => xs.clone(),
            Self::ReLU => xs.relu()?,
            Self::LeakyReLU(slope) => candle_nn::ops::leaky_relu(xs, *slope)?,
            Self::Sigmoid => candle_nn::ops::sigmoid(xs)?,
            Self::Tanh => xs.tanh()?,
        })
    }
}
