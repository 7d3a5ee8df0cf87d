use std::sync::{Mutex, MutexGuard};

use burn::tensor::{backend::Backend, Tensor};
use rand::{rngs::StdRng, SeedableRng};

use crate::common::distributions::{distribution::BaseDistribution, normal::StandardNormalDiag};

/// Source of the base-distribution noise used for reparameterized sampling.
///
/// Noise is drawn on the host from a seedable `StdRng`, so it never depends
/// on the policy weights and a reseed replays the exact same latents.
#[derive(Debug)]
pub struct LatentSampler {
    rng: Mutex<StdRng>,
}

impl LatentSampler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rng: Mutex::new(rng),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reseed(&self, seed: u64) {
        *self.lock() = StdRng::seed_from_u64(seed);
    }

    pub fn sample<B: Backend>(
        &self,
        base: &StandardNormalDiag,
        batch_size: usize,
        device: &B::Device,
    ) -> Tensor<B, 2> {
        BaseDistribution::<B>::sample(base, batch_size, &mut self.lock(), device)
    }
}

impl Clone for LatentSampler {
    fn clone(&self) -> Self {
        Self {
            rng: Mutex::new(self.lock().clone()),
        }
    }
}
