use std::fmt::Debug;

use burn::tensor::{backend::Backend, Tensor};
use rand::rngs::StdRng;

/// A distribution over flat events of a fixed size, evaluated in batches.
///
/// # Shapes
/// samples and values: (batch, event_size)
/// log probabilities: (batch, 1)
pub trait BaseDistribution<B: Backend>: Debug {
    fn event_size(&self) -> usize;

    /// Draws `batch_size` independent events. Randomness comes from `rng`,
    /// never from the distribution parameters, so the draw carries no graph.
    fn sample(&self, batch_size: usize, rng: &mut StdRng, device: &B::Device) -> Tensor<B, 2>;

    fn log_prob(&self, value: Tensor<B, 2>) -> Tensor<B, 2>;

    fn mean(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 2>;

    fn mode(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 2> {
        self.mean(batch_size, device)
    }

    fn entropy(&self) -> f32;

    fn perplexity(&self) -> f32 {
        self.entropy().exp()
    }
}
