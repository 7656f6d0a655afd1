use super::{mlp_forward, MlpConfig};
use crate::model::{SubModel1, SubModel2};
use anyhow::Result;
use candle_core::{Device, Tensor, D};
use candle_nn::{linear, Linear, VarBuilder};

fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut dims = vec![config.in_dim];
    dims.extend(config.units.iter().copied());
    dims.push(config.out_dim);
    let vs = vs.pp(prefix);

    dims.windows(2)
        .enumerate()
        .map(|(i, w)| -> Result<Linear> { Ok(linear(w[0], w[1], vs.pp(format!("ln{}", i)))?) })
        .collect()
}

/// Multilayer perceptron.
///
/// As a [`SubModel2`] the two inputs are concatenated along the last axis,
/// which is how the critic consumes `(state, action)`.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl Mlp {
    fn build_(vs: VarBuilder, config: MlpConfig) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }

    fn forward_(&self, xs: Tensor) -> Result<Tensor> {
        mlp_forward(
            xs,
            &self.layers,
            &self.config.hidden_activation,
            &self.config.out_activation,
        )
    }
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        self.forward_(xs.to_device(&self.device)?)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::build_(vs, config)
    }
}

impl SubModel2 for Mlp {
    type Config = MlpConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Tensor> {
        let input1 = input1.to_device(&self.device)?;
        let input2 = input2.to_device(&self.device)?;
        let input = Tensor::cat(&[input1, input2], D::Minus1)?;
        self.forward_(input)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        Self::build_(vs, config)
    }
}
