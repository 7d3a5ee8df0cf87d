use burn::{config::Config, tensor::backend::Backend};

use crate::common::{error::PolicyError, utils::modules::Activation};

use super::{conditioner::SCALE_DIAG_MIN_MAX, gaussian::GaussianPolicy};

#[derive(Config, Debug)]
pub struct GaussianPolicyConfig {
    /// Feature width of each conditioning source, in concatenation order
    pub input_shapes: Vec<usize>,
    /// Action shape. Only flat actions are supported, so this holds one value
    pub output_shape: Vec<usize>,
    /// Widths of the hidden dense layers. May be empty
    pub hidden_layer_sizes: Vec<usize>,
    #[config(default = true)]
    pub squash: bool,
    /// Accepted for compatibility with stored configs. No regularization
    /// is applied yet.
    #[config(default = 1e-3)]
    pub regularization_coeff: f32,
    #[config(default = "Activation::Relu")]
    pub activation: Activation,
    #[config(default = "Activation::Linear")]
    pub output_activation: Activation,
    #[config(default = "None")]
    pub name: Option<String>,
    /// Seed for the latent sampler. Seeded from OS entropy when absent
    #[config(default = "None")]
    pub seed: Option<u64>,
    #[config(default = "SCALE_DIAG_MIN_MAX.0")]
    pub log_scale_min: f32,
    #[config(default = "SCALE_DIAG_MIN_MAX.1")]
    pub log_scale_max: f32,
}

impl GaussianPolicyConfig {
    pub fn action_dim(&self) -> usize {
        self.output_shape.first().copied().unwrap_or(0)
    }

    pub fn condition_dim(&self) -> usize {
        self.input_shapes.iter().sum()
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.input_shapes.is_empty() {
            return Err(PolicyError::InvalidConfig(
                "at least one conditioning input is required".to_string(),
            ));
        }
        if self.input_shapes.contains(&0) {
            return Err(PolicyError::InvalidConfig(
                "conditioning inputs must have a positive width".to_string(),
            ));
        }
        if self.output_shape.len() != 1 {
            return Err(PolicyError::ShapeMismatch {
                what: "output_shape rank".to_string(),
                expected: 1,
                got: self.output_shape.len(),
            });
        }
        if self.action_dim() == 0 {
            return Err(PolicyError::InvalidConfig(
                "action dimension must be positive".to_string(),
            ));
        }
        if self.hidden_layer_sizes.contains(&0) {
            return Err(PolicyError::InvalidConfig(
                "hidden layer sizes must be positive".to_string(),
            ));
        }
        if !(self.log_scale_min < self.log_scale_max) {
            return Err(PolicyError::InvalidConfig(format!(
                "log scale range [{}, {}] is empty",
                self.log_scale_min, self.log_scale_max
            )));
        }

        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<GaussianPolicy<B>, PolicyError> {
        self.validate()?;

        Ok(GaussianPolicy::new(self.clone(), device))
    }
}
