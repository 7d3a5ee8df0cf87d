pub mod conditioner;
pub mod config;
pub mod gaussian;
pub mod sampler;

use burn::tensor::{backend::Backend, Tensor};

use crate::common::logger::LogItem;

pub use config::GaussianPolicyConfig;
pub use gaussian::{GaussianPolicy, TrainableVariable};

/// A stochastic policy over continuous actions, conditioned on one or more
/// (batch, width) input tensors.
pub trait Policy<B: Backend> {
    /// Draws one action per conditioning row. Differentiable with respect to
    /// the policy weights.
    ///
    /// # Panics
    /// If the number of conditioning tensors differs from the configured
    /// inputs, or their shapes do not fit the network.
    fn actions(&self, conditions: &[Tensor<B, 2>]) -> Tensor<B, 2>;

    /// Log density of `actions` under the policy for the same conditioning
    /// rows. Returns a (batch, 1) column.
    ///
    /// # Panics
    /// On the same conditioning mismatches as `actions`, or if `actions` is
    /// not (batch, action_dim).
    fn log_pis(&self, conditions: &[Tensor<B, 2>], actions: Tensor<B, 2>) -> Tensor<B, 2>;

    /// Clears per-episode state. Feed-forward policies carry none.
    fn reset(&mut self) {}

    /// Named statistics for a batch of conditioning inputs, for logging.
    /// Empty for now. Summary statistics of the shift and log-scale over
    /// `batch` (mean, min, max, std) are the intended additions.
    fn get_diagnostics(&self, _iteration: usize, _batch: &[Tensor<B, 2>]) -> LogItem {
        LogItem::default()
    }
}
