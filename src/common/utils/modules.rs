use std::{fmt::Display, str::FromStr};

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{
        activation::{gelu, relu, sigmoid},
        backend::Backend,
        Tensor,
    },
};

use crate::common::distributions::bijector::softplus;

/// Elementwise nonlinearity, selectable by name from configuration.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
    Softplus,
    Gelu,
    Linear,
}

impl Activation {
    pub fn apply<B: Backend>(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            Activation::Relu => relu(x),
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => sigmoid(x),
            Activation::Softplus => softplus(x),
            Activation::Gelu => gelu(x),
            Activation::Linear => x,
        }
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relu" => Ok(Activation::Relu),
            "tanh" => Ok(Activation::Tanh),
            "sigmoid" => Ok(Activation::Sigmoid),
            "softplus" => Ok(Activation::Softplus),
            "gelu" => Ok(Activation::Gelu),
            "linear" | "identity" | "none" => Ok(Activation::Linear),
            other => Err(format!("unknown activation '{other}'")),
        }
    }
}

impl Display for Activation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Activation::Relu => "relu",
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::Softplus => "softplus",
            Activation::Gelu => "gelu",
            Activation::Linear => "linear",
        };

        write!(f, "{name}")
    }
}

/// Stack of dense layers. `sizes` lists every width including input and
/// output, so `[3, 4]` is a single affine layer with no hidden units.
#[derive(Debug, Module)]
pub struct MLP<B: Backend> {
    layers: Vec<Linear<B>>,
}

impl<B: Backend> MLP<B> {
    pub fn new(sizes: &[usize], device: &B::Device) -> Self {
        assert!(sizes.len() >= 2, "an MLP needs an input and an output size");

        let layers = sizes
            .windows(2)
            .map(|w| LinearConfig::new(w[0], w[1]).init(device))
            .collect();

        Self { layers }
    }

    pub fn n_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn forward(
        &self,
        x: Tensor<B, 2>,
        activation: Activation,
        output_activation: Activation,
    ) -> Tensor<B, 2> {
        let last = self.layers.len() - 1;
        let mut x_ = x;

        for (i, layer) in self.layers.iter().enumerate() {
            x_ = layer.forward(x_);
            x_ = if i == last {
                output_activation.apply(x_)
            } else {
                activation.apply(x_)
            };
        }

        x_
    }
}
