use std::f32::consts::PI;

use burn::tensor::{backend::Backend, Tensor, TensorData};
use rand::{rngs::StdRng, Rng};
use rand_distr::StandardNormal;

use super::distribution::BaseDistribution;

/// Multivariate normal over R^n with zero mean and identity covariance.
///
/// Stateless apart from the event size, so it is cheap to rebuild inside
/// every sampling or scoring call.
#[derive(Debug, Clone, Copy)]
pub struct StandardNormalDiag {
    size: usize,
}

impl StandardNormalDiag {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "event size must be positive");

        Self { size }
    }

    fn log_normaliser(&self) -> f32 {
        0.5 * self.size as f32 * (2.0 * PI).ln()
    }
}

impl<B: Backend> BaseDistribution<B> for StandardNormalDiag {
    fn event_size(&self) -> usize {
        self.size
    }

    fn sample(&self, batch_size: usize, rng: &mut StdRng, device: &B::Device) -> Tensor<B, 2> {
        let data: Vec<f32> = (0..batch_size * self.size)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();

        Tensor::from_data(TensorData::new(data, [batch_size, self.size]), device)
    }

    fn log_prob(&self, value: Tensor<B, 2>) -> Tensor<B, 2> {
        value
            .powf_scalar(2.0)
            .sum_dim(1)
            .mul_scalar(-0.5)
            .sub_scalar(self.log_normaliser())
    }

    fn mean(&self, batch_size: usize, device: &B::Device) -> Tensor<B, 2> {
        Tensor::zeros([batch_size, self.size], device)
    }

    fn entropy(&self) -> f32 {
        0.5 * self.size as f32 * (1.0 + (2.0 * PI).ln())
    }
}
