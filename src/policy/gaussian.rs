use burn::{
    module::{Module, ModuleVisitor, ParamId},
    tensor::{backend::Backend, Tensor},
};

use crate::common::{
    distributions::normal::StandardNormalDiag,
    error::PolicyError,
    to_tensor::{tensor_to_rows, ToTensorF},
    utils::modules::MLP,
};

use super::{
    conditioner::{Conditioner, PolicyParameters},
    config::GaussianPolicyConfig,
    sampler::LatentSampler,
    Policy,
};

/// A learnable weight of the policy, as seen by an external optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainableVariable {
    pub id: ParamId,
    pub shape: Vec<usize>,
}

#[derive(Default)]
struct VariableCollector {
    variables: Vec<TrainableVariable>,
}

impl<B: Backend> ModuleVisitor<B> for VariableCollector {
    fn visit_float<const D: usize>(&mut self, id: &ParamId, tensor: &Tensor<B, D>) {
        self.variables.push(TrainableVariable {
            id: id.clone(),
            shape: tensor.dims().to_vec(),
        });
    }
}

/// Diagonal Gaussian policy with an optional tanh squash.
///
/// Actions are `squash(shift + exp(log_scale) * z)` with `z ~ N(0, I)` and
/// `(shift, log_scale)` computed from the conditioning inputs. Scoring
/// recomputes the parameters from the same weights and inverts the same
/// bijector chain, so any action this policy samples can be scored by it.
#[derive(Debug, Clone)]
pub struct GaussianPolicy<B: Backend> {
    config: GaussianPolicyConfig,
    conditioner: Conditioner<B>,
    sampler: LatentSampler,
    device: B::Device,
}

impl<B: Backend> GaussianPolicy<B> {
    /// Builds the policy without validating `config`. Prefer
    /// `GaussianPolicyConfig::init`.
    pub fn new(config: GaussianPolicyConfig, device: &B::Device) -> Self {
        Self {
            conditioner: Conditioner::new(&config, device),
            sampler: LatentSampler::new(config.seed),
            device: device.clone(),
            config,
        }
    }

    pub fn config(&self) -> &GaussianPolicyConfig {
        &self.config
    }

    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    pub fn action_dim(&self) -> usize {
        self.conditioner.action_dim()
    }

    pub fn squash(&self) -> bool {
        self.config.squash
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn base_distribution(&self) -> StandardNormalDiag {
        StandardNormalDiag::new(self.action_dim())
    }

    /// Restarts the latent noise stream.
    pub fn seed(&self, seed: u64) {
        self.sampler.reseed(seed);
    }

    /// Shift and clipped log-scale for each conditioning row.
    pub fn parameters(&self, conditions: &[Tensor<B, 2>]) -> PolicyParameters<B> {
        self.conditioner.forward(conditions)
    }

    /// The sampling path with caller-supplied base noise of shape
    /// (batch, action_dim).
    pub fn actions_from_latents(
        &self,
        conditions: &[Tensor<B, 2>],
        latents: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let params = self.conditioner.forward(conditions);

        params.distribution(self.config.squash).transform(latents)
    }

    pub fn conditioner_net(&self) -> &MLP<B> {
        self.conditioner.net()
    }

    /// Installs weights returned by an optimizer step.
    pub fn set_conditioner_net(&mut self, net: MLP<B>) {
        self.conditioner.set_net(net);
    }

    /// Every learnable tensor, in layer order (weight then bias).
    pub fn trainable_variables(&self) -> Vec<TrainableVariable> {
        let mut collector = VariableCollector::default();
        self.conditioner.net().visit(&mut collector);

        collector.variables
    }

    pub fn num_params(&self) -> usize {
        self.conditioner.net().num_params()
    }

    fn upload_conditions(
        &self,
        conditions: &[Vec<Vec<f32>>],
    ) -> Result<Vec<Tensor<B, 2>>, PolicyError> {
        let shapes = self.conditioner.input_shapes();

        if conditions.len() != shapes.len() {
            return Err(PolicyError::ShapeMismatch {
                what: "number of conditioning inputs".to_string(),
                expected: shapes.len(),
                got: conditions.len(),
            });
        }

        let batch_size = conditions.first().map(|rows| rows.len()).unwrap_or(0);

        conditions
            .iter()
            .zip(shapes.iter())
            .map(|(rows, &width)| {
                if rows.len() != batch_size {
                    return Err(PolicyError::ShapeMismatch {
                        what: "conditioning batch size".to_string(),
                        expected: batch_size,
                        got: rows.len(),
                    });
                }
                if let Some(row) = rows.iter().find(|r| r.len() != width) {
                    return Err(PolicyError::ShapeMismatch {
                        what: "conditioning input width".to_string(),
                        expected: width,
                        got: row.len(),
                    });
                }

                rows.clone().to_tensor::<B>(&self.device)
            })
            .collect()
    }

    fn batch_size(conditions: &[Tensor<B, 2>]) -> usize {
        conditions.first().map(|c| c.dims()[0]).unwrap_or(0)
    }

    /// `actions` on host arrays. The result carries no autodiff graph.
    pub fn actions_np(&self, conditions: &[Vec<Vec<f32>>]) -> Result<Vec<Vec<f32>>, PolicyError> {
        let conditions = self.upload_conditions(conditions)?;

        if Self::batch_size(&conditions) == 0 {
            return Ok(Vec::new());
        }

        tensor_to_rows(self.actions(&conditions).detach())
    }

    /// `log_pis` on host arrays. Returns one single-element row per action.
    pub fn log_pis_np(
        &self,
        conditions: &[Vec<Vec<f32>>],
        actions: &[Vec<f32>],
    ) -> Result<Vec<Vec<f32>>, PolicyError> {
        let conditions = self.upload_conditions(conditions)?;
        let batch_size = Self::batch_size(&conditions);

        if actions.len() != batch_size {
            return Err(PolicyError::ShapeMismatch {
                what: "action batch size".to_string(),
                expected: batch_size,
                got: actions.len(),
            });
        }
        if let Some(a) = actions.iter().find(|a| a.len() != self.action_dim()) {
            return Err(PolicyError::ShapeMismatch {
                what: "action width".to_string(),
                expected: self.action_dim(),
                got: a.len(),
            });
        }
        if batch_size == 0 {
            return Ok(Vec::new());
        }

        let actions = actions.to_vec().to_tensor::<B>(&self.device)?;

        tensor_to_rows(self.log_pis(&conditions, actions).detach())
    }
}

impl<B: Backend> Policy<B> for GaussianPolicy<B> {
    fn actions(&self, conditions: &[Tensor<B, 2>]) -> Tensor<B, 2> {
        let params = self.conditioner.forward(conditions);
        let latents =
            self.sampler
                .sample::<B>(&self.base_distribution(), params.batch_size(), &self.device);

        params.distribution(self.config.squash).transform(latents)
    }

    fn log_pis(&self, conditions: &[Tensor<B, 2>], actions: Tensor<B, 2>) -> Tensor<B, 2> {
        // recomputed rather than cached, the conditioning batch may differ
        // from the one used to sample
        let params = self.conditioner.forward(conditions);

        params.distribution(self.config.squash).log_prob(actions)
    }
}
