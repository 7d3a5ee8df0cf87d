use burn::tensor::{backend::Backend, Tensor};
use rand::rngs::StdRng;

use super::{bijector::Bijector, distribution::BaseDistribution};

/// A base distribution pushed forward through a bijector.
///
/// Sampling draws from the base and applies `bijector.forward`. Density is
/// the change of variables in the other direction:
/// `log p(y) = log p_base(x) - sum(log |dy/dx|)` with `x = bijector.inverse(y)`.
#[derive(Debug, Clone)]
pub struct TransformedDistribution<B: Backend, D: BaseDistribution<B>> {
    base: D,
    bijector: Box<dyn Bijector<B>>,
}

impl<B: Backend, D: BaseDistribution<B>> TransformedDistribution<B, D> {
    pub fn new(base: D, bijector: Box<dyn Bijector<B>>) -> Self {
        Self { base, bijector }
    }

    pub fn base(&self) -> &D {
        &self.base
    }

    pub fn bijector(&self) -> &dyn Bijector<B> {
        self.bijector.as_ref()
    }

    /// Pushes already drawn base samples through the bijector.
    pub fn transform(&self, latents: Tensor<B, 2>) -> Tensor<B, 2> {
        self.bijector.forward(latents)
    }

    pub fn sample(&self, batch_size: usize, rng: &mut StdRng, device: &B::Device) -> Tensor<B, 2> {
        self.transform(self.base.sample(batch_size, rng, device))
    }

    /// # Shapes
    /// value: (batch, event_size)
    /// return: (batch, 1)
    pub fn log_prob(&self, value: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.bijector.inverse(value);
        let ldj = self.bijector.forward_log_det_jacobian(x.clone()).sum_dim(1);

        self.base.log_prob(x) - ldj
    }
}
