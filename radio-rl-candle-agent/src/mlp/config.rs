use crate::{
    util::{InDim, OutDim},
    Activation,
};
use serde::{Deserialize, Serialize};

/// Configuration of [`Mlp`](super::Mlp).
///
/// Hidden layers have the widths in `units`; a layer `in_dim -> units[0]`
/// comes first and a layer `units[last] -> out_dim` comes last.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MlpConfig {
    pub(super) in_dim: usize,
    pub(super) units: Vec<usize>,
    pub(super) out_dim: usize,
    pub(super) hidden_activation: Activation,
    pub(super) out_activation: Activation,
}

impl MlpConfig {
    /// Creates a configuration with ReLU hidden layers and no output activation.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            hidden_activation: Activation::ReLU,
            out_activation: Activation::None,
        }
    }

    /// Sets the activation of hidden layers.
    pub fn hidden_activation(mut self, v: Activation) -> Self {
        self.hidden_activation = v;
        self
    }

    /// Sets the activation of the output layer.
    pub fn out_activation(mut self, v: Activation) -> Self {
        self.out_activation = v;
        self
    }

    /// Input dimension.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }
}

impl InDim for MlpConfig {
    fn get_in_dim(&self) -> usize {
        self.in_dim
    }
}

impl OutDim for MlpConfig {
    fn get_out_dim(&self) -> usize {
        self.out_dim
    }

    fn set_out_dim(&mut self, out_dim: usize) {
        self.out_dim = out_dim;
    }
}
